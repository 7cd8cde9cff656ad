mod frequencies;
pub use frequencies::*;

/// Resizes `vec` to `len` and fills it with `default`, keeping the allocation.
pub fn prepare_cache_vec<T: Copy>(vec: &mut Vec<T>, len: usize, default: T) {
    vec.clear();
    vec.resize(len, default);
}

/// Returns true if every sample in `buffer` is below `threshold` in magnitude.
pub fn is_silent(buffer: &[f32], threshold: f32) -> bool {
    buffer.iter().all(|s| s.abs() < threshold)
}
