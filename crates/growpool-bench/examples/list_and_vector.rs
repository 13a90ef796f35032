//! A linked list and a vector sharing one pool.
//!
//! Demonstrates: build a pool → bind one allocator handle → build a
//! node-linked list and a growable vector through it → inspect the chunk
//! chain → clear and refill without creating new chunks.
//!
//! Logs at DEBUG, so chunk creation and reuse are printed:
//!
//! ```text
//! cargo run -p growpool-bench --example list_and_vector
//! ```

use allocator_api2::boxed::Box;
use allocator_api2::vec::Vec;
use growpool_arena::{MemPool, PoolAllocator, TracingObserver};

struct Node<'a> {
    value: i32,
    next: Option<Box<Node<'a>, PoolAllocator<'a, Node<'a>>>>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== growpool: list and vector on one pool ===\n");

    // Room for 1000 i32 per chunk.
    let mut pool = MemPool::new(1000 * std::mem::size_of::<i32>())
        .unwrap()
        .with_observer(TracingObserver);

    for round in 1..=2 {
        println!("Round {round}: 100 pushes into a list and a vector");
        {
            let allocator = PoolAllocator::<i32>::new(&pool);
            let nodes = allocator.rebind::<Node<'_>>();
            let mut list: Option<Box<Node<'_>, _>> = None;
            let mut v = Vec::new_in(allocator);

            for i in 0..100 {
                list = Some(Box::new_in(Node { value: i, next: list }, nodes));
                v.push(i);
            }

            let mut list_sum = 0;
            let mut cursor = list.as_deref();
            while let Some(node) = cursor {
                list_sum += node.value;
                cursor = node.next.as_deref();
            }
            let vec_sum: i32 = v.iter().sum();
            println!("  list sum = {list_sum}, vector sum = {vec_sum}");
            println!(
                "  chunks = {}, cursor at chunk {}, {} of {} bytes used",
                pool.chunk_count(),
                pool.current_chunk(),
                pool.used_bytes(),
                pool.memory_bytes()
            );
        }
        if round == 1 {
            // Nothing borrows the pool any more, so it may be cleared.
            pool.clear();
            println!("  cleared: chunks are kept for the next round\n");
        }
    }

    match pool.allocate(pool.chunk_bytes() + 1, 1) {
        Ok(_) => println!("\nunexpected: oversized request served"),
        Err(e) => println!("\noversized request rejected: {e}"),
    }
}
