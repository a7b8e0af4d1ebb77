use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("batch size must be greater than zero")]
    ZeroSize,
}

/// Split `population` into consecutive batches of `size`, preserving order.
///
/// Every batch holds exactly `size` items except possibly the last, which
/// holds the remainder. An empty population produces no batches.
pub fn partition<T: Clone>(population: &[T], size: usize) -> Result<Vec<Vec<T>>, BatchError> {
    if size == 0 {
        return Err(BatchError::ZeroSize);
    }

    Ok(population.chunks(size).map(|chunk| chunk.to_vec()).collect())
}
