use fetchlet::{Config, Endpoint, Headers, Loader, ResponseInit};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let mut loader = Loader::with_config(cfg);

    loader.bind(Endpoint::new("/", |_req, res| async move {
        let headers = Headers::from([("Content-Type", "text/plain"), ("Hi-Mom", "It works!")]);
        res.send("Hello, world!", ResponseInit::new(200).headers(headers))?;
        Ok::<_, anyhow::Error>(())
    }));

    loader.bind(Endpoint::new("/echo", |req, res| async move {
        let body: serde_json::Value = match req.json().await {
            Ok(body) => body,
            Err(e) => {
                res.send(e.to_string(), ResponseInit::new(400).header("Content-Type", "text/plain"))?;
                return Ok(());
            }
        };
        res.send(body.to_string(), ResponseInit::new(200).header("Content-Type", "application/json"))?;
        Ok::<_, anyhow::Error>(())
    }));

    let listener = tokio::net::TcpListener::bind(&loader.config().listen_addr).await?;

    tokio::select! {
        res = loader.serve(listener) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
