use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress bar over the documents being published, drawn on stderr.
pub fn setup_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stderr());
    let style = ProgressStyle::default_bar()
        .template("{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] Publish: {pos}/{len} ({per_sec}, {msg}) {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message("0 failed");
    pb
}
