use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{info, LevelFilter, SetLoggerError};
use std::future::Future;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static MULTI: OnceLock<MultiProgress> = OnceLock::new();


pub fn initialize_logging(log_level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = env_logger::builder()
        .filter_level(log_level)
        .parse_default_env() // Allow overriding log level through RUST_LOG env var
        .build();

    let multi = MULTI.get_or_init(MultiProgress::new);

    LogWrapper::new(multi.clone(), logger).try_init()
}

// Set up connection with log library so that progress bars don't jump around.
// Without initialized logging (e.g. in tests) bars are drawn hidden.
fn attach(pb: ProgressBar) -> ProgressBar {
    match MULTI.get() {
        Some(multi) => multi.add(pb),
        None => {
            pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
            pb
        }
    }
}

fn detach(pb: &ProgressBar) {
    pb.finish_and_clear();
    if let Some(multi) = MULTI.get() {
        multi.remove(pb);
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}


pub fn run_with_spinner<'a, F, Out>(
    target: &'a str, task_desc: &'a str, function: F,
) -> Out where
    F: FnOnce() -> Out,
{
    let start_time = Instant::now();

    let pb = attach(
        ProgressBar::new_spinner()
            .with_message(format!("{}...", task_desc))
            .with_style(style("{spinner:.white} [{elapsed:.green}] {msg}"))
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let out = function();

    detach(&pb);
    let elapsed = indicatif::HumanDuration(start_time.elapsed());
    info!(target: target, "{} finished (took {})", task_desc, elapsed);

    out
}

pub async fn run_with_spinner_async<'a, Fut, Out>(
    target: &'a str, task_desc: &'a str, future: Fut,
) -> Out where
    Fut: Future<Output = Out>,
{
    let start_time = Instant::now();

    let pb = attach(
        ProgressBar::new_spinner()
            .with_message(format!("{}...", task_desc))
            .with_style(style("{spinner:.white} [{elapsed:.green}] {msg}"))
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let out = future.await;

    detach(&pb);
    let elapsed = indicatif::HumanDuration(start_time.elapsed());
    info!(target: target, "{} finished (took {})", task_desc, elapsed);

    out
}

pub fn run_with_pb<'a, F, Out>(
    target: &'a str, task_desc: &'a str, total: u64, print_message: bool, function: F,
) -> Out where
    F: FnOnce(ProgressBar) -> Out,
{
    let start_time = Instant::now();

    let pb = attach(
        ProgressBar::new(total)
            .with_message(format!("{}...", task_desc))
            .with_style(
                style("[{elapsed:.green}] {msg} [{wide_bar:.cyan/blue}] {human_pos}/{human_len} [{eta}]")
                    .progress_chars("=> ")
            )
    );
    pb.enable_steady_tick(Duration::from_secs(1));

    let out = function(pb.clone());

    detach(&pb);
    if print_message {
        let elapsed = indicatif::HumanDuration(start_time.elapsed());
        info!(target: target, "{} finished (took {})", task_desc, elapsed);
    }

    out
}
