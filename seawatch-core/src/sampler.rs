use crate::error::SeawatchError;
use rand::Rng;
use seawatch_schemas::species::Species;

/// Exclusive upper bound on the number of detections attached to one reading.
pub const MAX_DETECTIONS: usize = 50;

/// Picks the species "detected" alongside a reading.
///
/// Draws a count in `0..MAX_DETECTIONS`, then that many entries uniformly from
/// `catalog` with replacement, so the same species can appear more than once.
/// The result keeps draw order.
pub fn sample_detected_species<R: Rng + ?Sized>(
    rng: &mut R,
    catalog: &[Species],
) -> Result<Vec<Species>, SeawatchError> {
    if catalog.is_empty() {
        return Err(SeawatchError::EmptySpeciesCatalog);
    }

    let count = rng.gen_range(0..MAX_DETECTIONS);
    let detected = (0..count)
        .map(|_| catalog[rng.gen_range(0..catalog.len())].clone())
        .collect();

    Ok(detected)
}
