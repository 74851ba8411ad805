//! Maps measured bar/space widths to a symbol of the PDF417 tables.

use crate::tables::{codeword_for_symbol, ratios, BARS_IN_MODULE, MODULES_IN_CODEWORD, SYMBOL_TABLE};

/// Returns the symbol best matching the eight measured widths, first bar
/// first. Widths are resampled to 17 modules and looked up exactly, falling
/// back to the symbol with the closest width ratios.
pub(crate) fn decoded_value(module_bit_count: &[u32; BARS_IN_MODULE]) -> u32 {
    let sampled = sample_bit_counts(module_bit_count);
    let symbol = bit_value(&sampled);
    if codeword_for_symbol(symbol).is_some() {
        return symbol;
    }
    closest_value(module_bit_count)
}

fn sample_bit_counts(module_bit_count: &[u32; BARS_IN_MODULE]) -> [u32; BARS_IN_MODULE] {
    let sum = module_bit_count.iter().sum::<u32>() as f32;
    let mut result = [0; BARS_IN_MODULE];
    let mut bit_index = 0;
    let mut sum_previous_bits = 0;

    for i in 0..MODULES_IN_CODEWORD {
        let sample = sum / (2 * MODULES_IN_CODEWORD) as f32 + (i as f32 * sum) / MODULES_IN_CODEWORD as f32;
        if bit_index < BARS_IN_MODULE - 1 && (sum_previous_bits + module_bit_count[bit_index]) as f32 <= sample {
            sum_previous_bits += module_bit_count[bit_index];
            bit_index += 1;
        }
        result[bit_index] += 1;
    }
    result
}

/// Packs module counts into a 17-bit pattern, bars as ones.
fn bit_value(module_bit_count: &[u32; BARS_IN_MODULE]) -> u32 {
    let mut result = 0;
    for (i, &count) in module_bit_count.iter().enumerate() {
        let bit = u32::from(i % 2 == 0);
        for _ in 0..count {
            result = (result << 1) | bit;
        }
    }
    result
}

fn closest_value(module_bit_count: &[u32; BARS_IN_MODULE]) -> u32 {
    let sum = module_bit_count.iter().sum::<u32>();
    let mut measured = [0.0f32; BARS_IN_MODULE];
    if sum > 1 {
        for (ratio, &count) in measured.iter_mut().zip(module_bit_count) {
            *ratio = count as f32 / sum as f32;
        }
    }

    let mut best_error = f32::MAX;
    let mut best = 0;
    for (&symbol, table) in SYMBOL_TABLE.iter().zip(ratios()) {
        let mut error = 0.0f32;
        for (expected, actual) in table.iter().zip(&measured) {
            let diff = expected - actual;
            error += diff * diff;
            if error >= best_error {
                break;
            }
        }
        if error < best_error {
            best_error = error;
            best = symbol;
        }
    }
    best
}
