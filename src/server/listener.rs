use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::http::connection::Connection;
use crate::routing::Dispatcher;

pub async fn run(listener: TcpListener, dispatcher: Arc<Dispatcher>, cfg: Arc<Config>) -> anyhow::Result<()> {
    info!("Listening on {}", listener.local_addr()?);

    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let dispatcher = Arc::clone(&dispatcher);
        let cfg = Arc::clone(&cfg);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, dispatcher, &cfg);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
