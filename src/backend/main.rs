/**
 * xfcollab-inspect
 *
 * Prints the server id of a document database and the persisted history of
 * the named documents as JSON. Without document names it lists every
 * persisted document.
 *
 * ```text
 * xfcollab-inspect [--config <path>] [<doc>...]
 * ```
 *
 * Loading a document that does not exist yet creates its empty record, the
 * same as the first session touching it would.
 */

use std::path::PathBuf;

use xfcollab::backend::error::BackendError;
use xfcollab::backend::realtime::AuditLog;
use xfcollab::backend::server::config::{init_tracing, load_config};
use xfcollab::backend::store::DocumentStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut docs = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                config_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("usage: xfcollab-inspect [--config <path>] [<doc>...]");
                return Ok(());
            }
            _ => docs.push(arg),
        }
    }

    let config = load_config(config_path.as_deref())?;
    init_tracing(&config);
    tracing::info!("[STARTUP] Inspecting {}", config.database_url);

    let store = DocumentStore::connect(&config, AuditLog::default()).await?;
    println!("server id: {}", store.server_id());

    let outcome = inspect(&store, &docs).await;
    store.on_close().await;
    if let Err(e) = &outcome {
        eprintln!("{}", serde_json::Value::from(e));
    }
    Ok(outcome?)
}

async fn inspect(store: &DocumentStore, docs: &[String]) -> Result<(), BackendError> {
    if docs.is_empty() {
        for name in store.list_documents().await? {
            println!("{}", name);
        }
        return Ok(());
    }
    for doc in docs {
        let history = store.load(doc).await?;
        let json = serde_json::to_string_pretty(&history)?;
        println!("{}:\n{}", doc, json);
    }
    Ok(())
}
