use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::domain_types::{canonicalize, Ticker, TickerError};
use crate::monitor::PortfolioMetrics;
use crate::storage::models::{ConstituentFilter, IndexConstituent, IndexConstituentInsert};
use crate::storage::repository::IndexConstituentRepository;

/// 成分股不可變快照
#[derive(Debug, Clone)]
pub struct ConstituentSnapshot {
    rows: Vec<IndexConstituent>,
    by_ticker: HashMap<String, usize>,
    loaded_at: Option<DateTime<Utc>>,
}

impl ConstituentSnapshot {
    /// 空快照，尚未載入任何資料
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            by_ticker: HashMap::new(),
            loaded_at: None,
        }
    }

    fn from_rows(mut rows: Vec<IndexConstituent>) -> Self {
        rows.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        let by_ticker = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (row.ticker.clone(), idx))
            .collect();

        Self {
            rows,
            by_ticker,
            loaded_at: Some(Utc::now()),
        }
    }

    /// 不分大小寫查詢代號
    pub fn get(&self, ticker: &str) -> Option<&IndexConstituent> {
        self.by_ticker
            .get(&canonicalize(ticker))
            .map(|&idx| &self.rows[idx])
    }

    pub fn filter(&self, filter: &ConstituentFilter) -> Vec<IndexConstituent> {
        self.rows.iter().filter(|c| filter.matches(c)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }
}

/// 正規化代號並去除重複，重複時保留第一筆，代號為空的列捨棄
///
/// 代號規則與新增持股相同，任一列格式錯誤時整批拒絕。
pub fn normalize_constituents(
    rows: Vec<IndexConstituentInsert>,
) -> Result<Vec<IndexConstituentInsert>, TickerError> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut normalized = Vec::with_capacity(rows.len());

    for mut row in rows {
        if row.ticker.trim().is_empty() {
            warn!("略過代號為空的成分股");
            continue;
        }
        row.ticker = Ticker::parse(&row.ticker)?.into_inner();
        if !seen.insert(row.ticker.clone()) {
            warn!(ticker = %row.ticker, "略過重複的成分股代號");
            continue;
        }
        normalized.push(row);
    }

    Ok(normalized)
}

/// 進程內成分股快取
///
/// 讀取端取得 `Arc` 快照後即可釋放鎖，更新時整體替換指標，快照本身不會被修改。
#[derive(Debug)]
pub struct ConstituentCache {
    current: RwLock<Arc<ConstituentSnapshot>>,
}

impl Default for ConstituentCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstituentCache {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(ConstituentSnapshot::empty())),
        }
    }

    pub fn snapshot(&self) -> Arc<ConstituentSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// 以新資料替換快照
    pub fn replace(&self, rows: Vec<IndexConstituent>) -> Arc<ConstituentSnapshot> {
        let snapshot = Arc::new(ConstituentSnapshot::from_rows(rows));
        *self.current.write() = Arc::clone(&snapshot);
        snapshot
    }

    pub fn lookup(&self, ticker: &str) -> Option<IndexConstituent> {
        self.snapshot().get(ticker).cloned()
    }

    /// 寫入儲存後替換快照，寫入失敗時保留舊快照
    pub async fn refresh_from(
        &self,
        repo: &dyn IndexConstituentRepository,
        rows: Vec<IndexConstituentInsert>,
    ) -> Result<Arc<ConstituentSnapshot>> {
        let rows = normalize_constituents(rows)?;

        match repo.replace_all(&rows).await {
            Ok(stored) => {
                let snapshot = self.replace(stored);
                PortfolioMetrics::record_constituent_refresh(snapshot.len(), true);
                info!(count = snapshot.len(), "成分股快照已更新");
                Ok(snapshot)
            }
            Err(e) => {
                PortfolioMetrics::record_constituent_refresh(0, false);
                Err(e)
            }
        }
    }

    /// 啟動時由儲存載入快照
    pub async fn load_from(
        &self,
        repo: &dyn IndexConstituentRepository,
    ) -> Result<Arc<ConstituentSnapshot>> {
        let rows = repo.list_constituents(&ConstituentFilter::default()).await?;
        let snapshot = self.replace(rows);
        info!(count = snapshot.len(), "已載入成分股快照");
        Ok(snapshot)
    }
}
