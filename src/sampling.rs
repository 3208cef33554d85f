use rand::{prelude::*, rngs::SmallRng};
use rand_distr::{Distribution, Uniform};

pub fn small_rng(seed: [u32; 4]) -> SmallRng {
    let mut bytes = [0; 16];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(seed.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }

    SmallRng::from_seed(bytes)
}

/// How many of `len` items a `fraction` selects, rounding down.
pub fn fraction_of(len: usize, fraction: f32) -> usize {
    ((len as f64) * f64::from(fraction)).floor() as usize
}

/// `n` indices into a sequence of `len` items, drawn with replacement.
pub fn sample_indices_with_replacement(
    len: usize,
    n: usize,
    rng: &mut impl Rng,
) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }

    let dist = Uniform::from(0..len);

    dist.sample_iter(rng).take(n).collect()
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
