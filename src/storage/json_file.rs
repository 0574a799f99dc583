use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::models::{BalanceRecord, Id, Wallet};

use super::{sort_wallets, Storage};

/// JSON file-based storage implementation.
///
/// Directory structure:
/// ```text
/// data/
///   wallets/
///     {id}/
///       wallet.json
///       balances.jsonl
/// ```
pub struct JsonFileStorage {
    base_path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn wallets_dir(&self) -> PathBuf {
        self.base_path.join("wallets")
    }

    fn wallet_dir(&self, id: &Id) -> Result<PathBuf> {
        if !Id::is_path_safe(id.as_str()) {
            bail!("Invalid id path segment: {id:?}");
        }
        Ok(self.wallets_dir().join(id.as_str()))
    }

    fn wallet_file(&self, id: &Id) -> Result<PathBuf> {
        Ok(self.wallet_dir(id)?.join("wallet.json"))
    }

    fn balances_file(&self, wallet_id: &Id) -> Result<PathBuf> {
        Ok(self.wallet_dir(wallet_id)?.join("balances.jsonl"))
    }

    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create directory")?;
        }
        Ok(())
    }

    async fn read_json<T: for<'de> serde::Deserialize<'de>>(&self, path: &Path) -> Result<Option<T>> {
        match fs::read_to_string(path).await {
            Ok(content) => {
                let value = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse JSON from {:?}", path))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read file"),
        }
    }

    async fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        self.ensure_dir(path).await?;
        let content = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
        fs::write(path, content)
            .await
            .context("Failed to write file")?;
        Ok(())
    }

    /// Reads a JSONL file, skipping lines that do not parse.
    async fn read_jsonl<T: for<'de> serde::Deserialize<'de>>(&self, path: &Path) -> Result<Vec<T>> {
        let file = match fs::File::open(path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).context("Failed to open file"),
        };

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut items = Vec::new();
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await.context("Failed to read line")? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(item) => items.push(item),
                Err(e) => warn!(path = %path.display(), line = line_no, error = %e, "skipping invalid JSONL line"),
            }
        }

        Ok(items)
    }

    async fn append_jsonl<T: serde::Serialize>(&self, path: &Path, item: &T) -> Result<()> {
        self.ensure_dir(path).await?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .context("Failed to open file for append")?;

        let mut line = serde_json::to_string(item).context("Failed to serialize item")?;
        line.push('\n');
        file.write_all(line.as_bytes())
            .await
            .context("Failed to append line")?;

        Ok(())
    }

    /// Directory names under `path` that are usable ids.
    async fn list_dirs(&self, path: &Path) -> Result<Vec<Id>> {
        let mut ids = Vec::new();

        let mut entries = match fs::read_dir(path).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e).context("Failed to read directory"),
        };

        while let Some(entry) = entries.next_entry().await.context("Failed to read entry")? {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                match Id::parse(name) {
                    Ok(id) => ids.push(id),
                    Err(e) => warn!(error = %e, "skipping unsafe wallet directory"),
                }
            }
        }

        Ok(ids)
    }

    /// Loads a wallet, trusting the directory name over the stored id.
    async fn load_wallet(&self, id: &Id) -> Result<Option<Wallet>> {
        let wallet: Option<Wallet> = self.read_json(&self.wallet_file(id)?).await?;
        Ok(wallet.map(|mut wallet| {
            if &wallet.id != id {
                warn!(dir_id = %id, stored_id = %wallet.id, "wallet id does not match its directory");
                wallet.id = id.clone();
            }
            wallet
        }))
    }
}

#[async_trait::async_trait]
impl Storage for JsonFileStorage {
    async fn list_wallets(&self) -> Result<Vec<Wallet>> {
        let ids = self.list_dirs(&self.wallets_dir()).await?;
        let mut wallets = Vec::new();

        for id in ids {
            match self.load_wallet(&id).await {
                Ok(Some(wallet)) => wallets.push(wallet),
                Ok(None) => {}
                Err(e) => warn!(wallet_id = %id, error = %e, "skipping unreadable wallet"),
            }
        }

        sort_wallets(&mut wallets);
        Ok(wallets)
    }

    async fn get_wallet(&self, id: &Id) -> Result<Option<Wallet>> {
        self.load_wallet(id).await
    }

    async fn save_wallet(&self, wallet: &Wallet) -> Result<()> {
        self.write_json(&self.wallet_file(&wallet.id)?, wallet).await
    }

    async fn delete_wallet(&self, id: &Id) -> Result<bool> {
        let dir = self.wallet_dir(id)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", dir.display())),
        }
    }

    async fn get_balance_records(&self, wallet_id: &Id) -> Result<Vec<BalanceRecord>> {
        self.read_jsonl(&self.balances_file(wallet_id)?).await
    }

    async fn append_balance_record(
        &self,
        wallet_id: &Id,
        symbol: &str,
        amount: Decimal,
    ) -> Result<BalanceRecord> {
        if fs::metadata(self.wallet_file(wallet_id)?).await.is_err() {
            bail!("Wallet not found: {wallet_id}");
        }

        let record = BalanceRecord::new(wallet_id.clone(), symbol, amount);
        self.append_jsonl(&self.balances_file(wallet_id)?, &record)
            .await?;
        Ok(record)
    }
}
