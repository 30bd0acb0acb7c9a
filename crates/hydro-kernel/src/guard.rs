//! Non-finite value detection for kernel outputs.

use hydro_core::{KernelError, Real};

/// Check that every value in a variable-major buffer is finite.
///
/// `stride` is the per-variable length; the error reports the variable
/// and the index within it of the first NaN or infinity.
pub fn ensure_finite(values: &[Real], stride: usize) -> Result<(), KernelError> {
    match values.iter().position(|v| !v.is_finite()) {
        None => Ok(()),
        Some(pos) => {
            let stride = stride.max(1);
            Err(KernelError::NonFinite {
                var: pos / stride,
                cell: pos % stride,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_buffer_passes() {
        assert!(ensure_finite(&[0.0, 1.0, -2.5, 1e300], 2).is_ok());
        assert!(ensure_finite(&[], 0).is_ok());
    }

    #[test]
    fn reports_variable_and_cell() {
        let buf = [0.0, 1.0, 2.0, 3.0, Real::NAN, 5.0];
        assert_eq!(
            ensure_finite(&buf, 3),
            Err(KernelError::NonFinite { var: 1, cell: 1 })
        );
    }

    #[test]
    fn infinity_is_rejected() {
        let buf = [Real::INFINITY];
        assert_eq!(
            ensure_finite(&buf, 1),
            Err(KernelError::NonFinite { var: 0, cell: 0 })
        );
    }
}
