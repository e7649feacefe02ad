use std::collections::HashMap;

/// Indices of the elements of a table that are in and out of service,
/// each list in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Status {
    pub on: Vec<usize>,
    pub off: Vec<usize>,
}

impl Status {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            on: Vec::with_capacity(capacity),
            off: Vec::default(),
        }
    }

    /// Splits `0..items.len()` by the predicate.
    pub fn partition<T>(items: &[T], is_on: impl Fn(&T) -> bool) -> Self {
        let mut status = Status::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if is_on(item) {
                status.on.push(i);
            } else {
                status.off.push(i);
            }
        }
        status
    }
}

/// Mapping between external bus numbers and consecutive internal
/// bus indices.
#[derive(Clone, Debug, Default)]
pub struct BusOrder {
    pub e2i: HashMap<usize, usize>,
    pub i2e: Vec<usize>,
}

impl BusOrder {
    pub(crate) fn new(nb: usize) -> Self {
        Self {
            e2i: HashMap::with_capacity(nb),
            i2e: Vec::with_capacity(nb),
        }
    }
}
