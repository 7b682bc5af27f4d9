use tracing::warn;

pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        warn!("{}", message);
    }
}
