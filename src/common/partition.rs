///
/// Block Partitioning Algorithm
/// See <https://www.rfc-editor.org/rfc/rfc5052#section-9.1>
///
/// # Arguments
///
///    * b: Maximum Source Block Length, i.e., the maximum number of source symbols per source block.
///
///    * l: Transfer Length in octets.
///
///    * e: Encoding Symbol Length in octets.
///
/// # Returns
///
/// A tuple of four values:
///     * a_large: The length of each of the larger source blocks in symbols.
///     * a_small: The length of each of the smaller source blocks in symbols.
///     * nb_a_large: The number of blocks composed of a_large symbols.
///     * nb_blocks: The total number of blocks.
///
pub fn block_partitioning(b: u64, l: u64, e: u64) -> (u64, u64, u64, u64) {
    if b == 0 {
        log::warn!("Maximum Source Block Length is 0");
        return (0, 0, 0, 0);
    }

    if e == 0 {
        log::error!("Encoding Symbol Length is 0");
        return (0, 0, 0, 0);
    }

    let t = num_integer::div_ceil(l, e);
    let n = num_integer::div_ceil(t, b);
    if n == 0 {
        return (0, 0, 0, 0);
    }

    let a_large = num_integer::div_ceil(t, n);
    let a_small = num_integer::div_floor(t, n);
    let nb_a_large = t - (a_small * n);
    let nb_blocks = n;

    (a_large, a_small, nb_a_large, nb_blocks)
}

///
/// `Partition[I, J]` function
/// See <https://www.rfc-editor.org/rfc/rfc5053#section-5.3.1.2>
///
/// Partitions `i` into `j` approximately equal parts. Returns
/// `(il, is, jl, js)`: the first `jl` parts are of length `il`, the
/// remaining `js` parts of length `is`.
///
pub fn partition(i: u32, j: u32) -> (u32, u32, u32, u32) {
    debug_assert!(j != 0);
    let il = num_integer::div_ceil(i, j);
    let is = num_integer::div_floor(i, j);
    let jl = i - is * j;
    let js = j - jl;
    (il, is, jl, js)
}

#[cfg(test)]
mod tests {

    #[test]
    pub fn partition_empty_file() {
        crate::tests::init();
        let (_, _, _, nb_blocks) = super::block_partitioning(64, 0, 1024);
        assert!(nb_blocks == 0);
    }

    #[test]
    pub fn partition_consistency() {
        crate::tests::init();
        for (b, l, e) in [
            (64u64, 2048u64, 512u64),
            (64, 1500, 512),
            (10, 100000, 1400),
            (3, 10000, 16),
            (1, 5, 4),
        ] {
            let (a_large, a_small, nb_a_large, nb_blocks) = super::block_partitioning(b, l, e);
            let nof_symbols = num_integer::div_ceil(l, e);
            assert_eq!(
                nb_a_large * a_large + (nb_blocks - nb_a_large) * a_small,
                nof_symbols
            );
            assert!(a_large - a_small <= 1);
            assert!(a_large <= b);
        }
    }

    #[test]
    pub fn partition_i_j() {
        crate::tests::init();
        for (i, j) in [(10u32, 3u32), (12, 4), (1, 1), (100, 7), (8, 5)] {
            let (il, is, jl, js) = super::partition(i, j);
            assert_eq!(jl + js, j);
            assert_eq!(jl * il + js * is, i);
            assert!(il - is <= 1);
        }
    }
}
