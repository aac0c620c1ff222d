//! Subsample factor selection for bounded decoding.

use super::types::ImageBounds;

/// Largest power-of-two subsample factor that keeps both decoded
/// dimensions at or above the target.
///
/// Half of each source dimension divided by the factor must still reach
/// the target, so the result is never smaller than requested. A zero or
/// negative target on either axis disables downsampling.
pub fn subsample_factor(source: ImageBounds, target_width: i32, target_height: i32) -> u32 {
    if target_width <= 0 || target_height <= 0 {
        return 1;
    }

    let (target_width, target_height) = (target_width as u32, target_height as u32);
    if source.height <= target_height && source.width <= target_width {
        return 1;
    }

    let half_height = source.height / 2;
    let half_width = source.width / 2;

    let mut factor: u32 = 1;
    while half_height / factor >= target_height && half_width / factor >= target_width {
        match factor.checked_mul(2) {
            Some(next) => factor = next,
            None => break,
        }
    }

    factor
}
