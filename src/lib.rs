/// Use mimalloc as the global allocator.
/// Each segment builds its own word table from thousands of small String
/// allocations on its own thread; mimalloc's thread-local caching keeps
/// workers from contending on the allocator.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod common;
pub mod wordfreq;
