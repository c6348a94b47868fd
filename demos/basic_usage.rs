//! Basic usage example of the directbuf pooled allocator

use std::sync::Arc;

use directbuf::{
    BufferPool, BufferPoolConfigBuilder, CollectingLeakReporter, LogLeakReporter, Result,
};

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    println!("directbuf Pooled Buffer Example");
    println!("===============================");

    let config = BufferPoolConfigBuilder::new("example_pool")
        .capacity_limit(2)
        .smallest_fit()
        .build()?;

    println!("\nCreating buffer pool: {}", config.name);
    let pool = BufferPool::new(config)?.with_reporter(Arc::new(LogLeakReporter));

    // Allocate and use buffers
    println!("\nAcquiring buffers...");
    let mut buffers = Vec::new();
    for i in 0..3 {
        let mut buffer = pool.acquire(256)?;
        buffer.extend_from_slice(format!("Hello from buffer {}", i).as_bytes())?;
        println!(
            "  Buffer {}: {} of {} bytes used, handle {}",
            i,
            buffer.len(),
            buffer.capacity(),
            buffer.handle()
        );
        buffers.push(buffer);
    }

    // Return buffers to pool
    println!("\nReleasing buffers...");
    for (i, buffer) in buffers.into_iter().enumerate() {
        let data = String::from_utf8_lossy(buffer.as_slice()).into_owned();
        let outcome = pool.release(buffer);
        println!("  Buffer {}: '{}' -> {:?}", i, data, outcome);
    }
    println!("  Available buffers after release: {}", pool.available_count());

    // Reuse
    let reused = pool.acquire(100)?;
    println!("\nAcquire(100) reused a {} byte buffer", reused.capacity());

    println!("\n{}", pool.stats().summary());

    // A deliberately forgotten buffer shows up in the audit
    let report = pool.audit_leaks();
    println!("\nLeak audit: {} outstanding buffer(s)", report.count());
    for entry in &report.entries {
        println!("  {:#x}: {} bytes (seq {})", entry.handle, entry.size, entry.sequence);
    }

    pool.release(reused);
    println!("After release, audit clean: {}", pool.audit_leaks().is_clean());

    // Audits can also be collected instead of logged
    let collector = Arc::new(CollectingLeakReporter::new());
    let quiet = BufferPool::new(BufferPoolConfigBuilder::new("quiet").build()?)?
        .with_reporter(collector.clone());
    quiet.audit_leaks();
    println!("Collected clean signals: {}", collector.clean_count());

    println!("\nExample completed successfully!");

    Ok(())
}
