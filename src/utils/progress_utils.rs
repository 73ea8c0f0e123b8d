use indicatif::{ProgressBar, ProgressStyle};
use std::{borrow::Cow, io::IsTerminal};

/// Progress bar for long replays. `None` when stderr is not a terminal,
/// so piped output and test runs stay clean.
pub fn progress_bar(len: u64, msg: impl Into<Cow<'static, str>>) -> Option<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }

    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise} / {eta_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
        .ok()?
        .progress_chars("##-");

    let bar = ProgressBar::new(len).with_style(style);
    bar.set_message(msg);

    Some(bar)
}
