use std::{io::Read, process};

use tagpool::{Allocation, Pool, PoolConfig};

/// Waits until the user presses ENTER, unless `TAGPOOL_NO_PAUSE` is set.
/// Handy for inspecting the process with `pmap` or `gdb` between steps.
fn block_until_enter_pressed() {
  if std::env::var_os("TAGPOOL_NO_PAUSE").is_some() {
    return;
  }
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn print_alloc(
  pool: &Pool,
  label: &str,
  size: usize,
  allocation: Option<Allocation>,
) {
  match allocation {
    Some(allocation) => println!(
      "[{}] Allocated {} bytes at {:p} (offset {}, usable {})",
      label,
      size,
      pool.as_ptr(allocation),
      allocation.offset(),
      pool.usable_size(allocation)
    ),
    None => println!("[{}] Allocation of {} bytes failed", label, size),
  }
}

/// Prints every block of the pool in address order.
fn print_blocks(pool: &Pool) {
  for block in pool.blocks() {
    println!(
      "    {:>8} .. {:>8}  {:>6} bytes  {}",
      block.offset,
      block.end(),
      block.size,
      if block.is_free { "free" } else { "used" }
    );
  }
  println!("    {}", pool.stats());
}

fn main() {
  let config = PoolConfig::from_env();

  let mut pool = match Pool::with_config(config) {
    Ok(pool) => pool,
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  };

  println!("Pool of {} bytes at {:?}", pool.capacity(), pool);
  print_blocks(&pool);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Two allocations carved from the front of the arena.
  // --------------------------------------------------------------------
  let first = pool.allocate(32);
  print_alloc(&pool, "1", 32, first);

  let second = pool.allocate(64);
  print_alloc(&pool, "1", 64, second);

  if let Some(second) = second {
    pool.payload_mut(second).fill(0xAB);
    println!("[1] Initialized second block with 0xAB");
  }
  print_blocks(&pool);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) A one byte request still gets a word aligned, minimum sized block.
  // --------------------------------------------------------------------
  let tiny = pool.allocate(1);
  print_alloc(&pool, "2", 1, tiny);
  if let Some(tiny) = tiny {
    let address = pool.as_ptr(tiny).as_ptr() as usize;
    println!(
      "[2] Address = {:#X}, addr % word = {}",
      address,
      address % tagpool::align::WORD_SIZE
    );
  }
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Free the first two blocks. They merge with each other.
  // --------------------------------------------------------------------
  pool.release(first);
  pool.release(second);
  println!("\n[3] Released first and second block");
  print_blocks(&pool);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) An 80 byte request fits in the merged hole.
  // --------------------------------------------------------------------
  let reused = pool.allocate(80);
  print_alloc(&pool, "4", 80, reused);
  println!(
    "[4] reused == first? {}",
    if reused.map(|a| a.offset()) == first.map(|a| a.offset()) {
      "Yes, it reused the merged block"
    } else {
      "No, it allocated somewhere else"
    }
  );
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) Ask for more than the pool holds.
  // --------------------------------------------------------------------
  let too_big = pool.capacity() + 1;
  let failed = pool.allocate(too_big);
  print_alloc(&pool, "5", too_big, failed);

  pool.release(tiny);
  pool.release(reused);
  println!("\n[6] Released everything");
  print_blocks(&pool);

  pool.release_arena();
  println!("\n[7] Arena handed back to the host allocator.");
}
