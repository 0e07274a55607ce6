use rabe_bn::Fr;

/// Converts a small integer (a child index, a threshold) into `Fr`.
pub fn usize_to_fr(value: usize) -> Fr {
    let mut result = Fr::zero();
    let mut base = Fr::one();
    let mut remaining = value;
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = result + base;
        }
        base = base + base;
        remaining >>= 1;
    }
    result
}

pub fn contains(data: &[usize], value: usize) -> bool {
    data.iter().any(|&i| i == value)
}

/// Sorted, duplicate free copy of an attribute list.
pub fn normalize_attributes(attributes: &[usize]) -> Vec<usize> {
    let mut attributes = attributes.to_vec();
    attributes.sort_unstable();
    attributes.dedup();
    attributes
}
