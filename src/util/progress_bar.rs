use indicatif::{ProgressState, ProgressStyle};

/// Shared style for byte-count progress bars, e.g. while decompressing the reference
pub fn get_byte_progress_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} ({percent}); ETA: {eta_precise}; Speed: {binary_bytes_per_sec} {msg}")
        .unwrap_or_else(|_e| ProgressStyle::default_bar())
        .with_key("percent", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{:.1}%", state.fraction() * 100.0);
        })
        .progress_chars("##-")
}
