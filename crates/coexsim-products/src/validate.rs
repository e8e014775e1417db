//! Band selection checks.

use coexsim_common::Band;

/// Bandwidth above which a window is flagged as suspicious (MHz).
pub const WIDE_BAND_MHZ: f64 = 1000.0;

/// Human-readable warnings for a band selection.
///
/// An empty selection yields exactly one warning and no further checks.
pub fn validate_band_configuration(bands: &[Band]) -> Vec<String> {
    if bands.is_empty() {
        return vec!["No bands selected for analysis".to_string()];
    }

    let mut warnings = Vec::new();
    for band in bands {
        let transmits = band.has_tx();
        if transmits && band.tx_low >= band.tx_high {
            warnings.push(format!("Invalid Tx range for {}: {} >= {}", band.code, band.tx_low, band.tx_high));
        }
        if band.rx_low >= band.rx_high {
            warnings.push(format!("Invalid Rx range for {}: {} >= {}", band.code, band.rx_low, band.rx_high));
        }
        if (transmits && band.tx_low <= 0.0) || band.rx_low <= 0.0 {
            warnings.push(format!(
                "Invalid frequency values for {}: frequencies must be positive",
                band.code
            ));
        }
    }

    for band in bands {
        if band.has_tx() {
            let tx_bw = band.tx_high - band.tx_low;
            if tx_bw > WIDE_BAND_MHZ {
                warnings.push(format!("Very wide Tx band for {}: {:.1} MHz", band.code, tx_bw));
            }
        }
        let rx_bw = band.rx_high - band.rx_low;
        if rx_bw > WIDE_BAND_MHZ {
            warnings.push(format!("Very wide Rx band for {}: {:.1} MHz", band.code, rx_bw));
        }
    }

    warnings
}
