use tracing::info;

use crate::{
    engine::OfflineCachePolicy,
    error::{Error, ResultContext},
    host::Host,
};

impl<H: Host> OfflineCachePolicy<H> {
    /// Notification click handler. Brings an open page to the front, or opens
    /// the app root if there isn't one.
    pub async fn notification_click(&self) -> Result<(), Error> {
        info!("Notification click received");

        let root = self.config.resolve(&self.config.root_path())?;
        self.host
            .focus_or_open_client(&root)
            .await
            .with_context(|| format!("Focusing or opening {root}"))
    }
}
