//! Services sharing one SQLite database, as separate processes would.

use async_trait::async_trait;
use rxlist_core::{
    CacheBackend, CacheKey, DrugRecord, DrugService, MedicationList, MedicationStore,
    RateLimitStore, RateLimiter, ResultCache, RxListError, SqliteCache, SqliteRateLimitStore,
    TerminologySource, UserId,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
struct CountingSource {
    searches: AtomicUsize,
    details: AtomicUsize,
}

#[async_trait]
impl TerminologySource for CountingSource {
    async fn check_exists(&self, rxcui: &str) -> rxlist_core::Result<bool> {
        Ok(rxcui != "0")
    }

    async fn fetch_details(&self, rxcui: &str) -> rxlist_core::Result<Option<DrugRecord>> {
        self.details.fetch_add(1, Ordering::SeqCst);
        Ok(Some(DrugRecord::new(
            rxcui,
            format!("Drug {}", rxcui),
            vec!["Ibuprofen".to_string()],
            vec!["Oral Product".to_string()],
        )))
    }

    async fn find_candidates(&self, _name: &str) -> rxlist_core::Result<Vec<String>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(vec!["5640".to_string(), "310965".to_string()])
    }
}

fn drug_service(db: &Path, source: Arc<CountingSource>) -> DrugService {
    let backend = Arc::new(SqliteCache::new(db).unwrap());
    DrugService::new(source, ResultCache::new(backend))
}

#[tokio::test]
async fn test_search_cache_shared_across_instances() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("rxlist.sqlite");

    let first_source = Arc::new(CountingSource::default());
    let second_source = Arc::new(CountingSource::default());
    let first = drug_service(&db, first_source.clone());
    let second = drug_service(&db, second_source.clone());

    let from_first = first.search("ibuprofen", 5).await.unwrap();
    let from_second = second.search("ibuprofen", 5).await.unwrap();

    assert_eq!(from_first, from_second);
    assert_eq!(from_first.len(), 2);
    assert_eq!(first_source.searches.load(Ordering::SeqCst), 1);
    assert_eq!(second_source.searches.load(Ordering::SeqCst), 0);
    assert_eq!(second_source.details.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_medication_flow_on_one_database() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("rxlist.sqlite");
    let user = UserId(42);

    let list = MedicationList::new(
        Arc::new(MedicationStore::open(&db).unwrap()),
        drug_service(&db, Arc::new(CountingSource::default())),
    );

    let item = list.add(user, "5640").await.unwrap();
    assert_eq!(item.drug_name, "Drug 5640");

    assert!(matches!(
        list.add(user, "5640").await,
        Err(RxListError::Conflict { .. })
    ));
    assert!(matches!(
        list.add(user, "0").await,
        Err(RxListError::InvalidRxcui { .. })
    ));

    let reopened = MedicationStore::open(&db).unwrap();
    assert_eq!(reopened.list(user).unwrap(), vec![item]);

    list.remove(user, "5640").unwrap();
    assert!(reopened.list(user).unwrap().is_empty());
}

#[test]
fn test_rate_limit_shared_across_instances() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("rxlist.sqlite");

    let first = RateLimiter::for_search(Arc::new(SqliteRateLimitStore::new(&db).unwrap()));
    let second = RateLimiter::for_search(Arc::new(SqliteRateLimitStore::new(&db).unwrap()));

    for _ in 0..5 {
        assert!(first.attempt("192.0.2.1").unwrap().is_allowed());
        assert!(second.attempt("192.0.2.1").unwrap().is_allowed());
    }

    assert!(!first.attempt("192.0.2.1").unwrap().is_allowed());
    assert!(!second.allow("192.0.2.1").unwrap());
}

#[tokio::test]
async fn test_expired_rows_are_reclaimed() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("rxlist.sqlite");
    let short = Duration::from_millis(1);

    let backend = Arc::new(SqliteCache::new(&db).unwrap());
    let cache = ResultCache::new(backend.clone());
    for i in 0..50 {
        let _: Vec<String> = cache
            .get_or_compute(&CacheKey::search(&format!("term{}", i)), short, || async {
                Ok(Vec::new())
            })
            .await
            .unwrap();
    }

    let rates = Arc::new(SqliteRateLimitStore::new(&db).unwrap());
    let limiter = RateLimiter::new(rates.clone(), "drug_search_", 10, short);
    for i in 0..50 {
        assert!(limiter.attempt(&format!("192.0.2.{}", i)).unwrap().is_allowed());
    }

    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(backend.entry_count().unwrap(), 50);
    assert_eq!(backend.cleanup_expired().unwrap(), 50);
    assert_eq!(backend.entry_count().unwrap(), 0);
    assert_eq!(rates.cleanup_expired().unwrap(), 50);
    assert_eq!(rates.cleanup_expired().unwrap(), 0);
}
