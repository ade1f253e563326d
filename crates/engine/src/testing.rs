//! In-process fetcher, fault-injecting storage and fixtures shared by the
//! engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pwacache_core::config::THUMBNAIL_PLACEHOLDER;
use pwacache_core::normalize::same_origin;
use pwacache_core::{
    AppConfig, CacheDb, CacheStorage, CacheStore, Error, Fetcher, NetworkFailure, Request, RequestKey, RequestMode,
    Response, ResponseKind, Snapshot,
};
use url::Url;

pub(crate) const THUMBNAIL: &str = "https://img.youtube.com/vi/dQw4w9WgXcQ/mqdefault.jpg";

pub(crate) fn scope() -> Url {
    Url::parse("http://localhost:8080/").unwrap()
}

/// Small application config: three local files plus the thumbnail placeholder.
pub(crate) fn test_config(generation: &str) -> AppConfig {
    AppConfig {
        generation: generation.into(),
        precache: ["/", "/index.html", "/app.js", THUMBNAIL_PLACEHOLDER].into_iter().map(String::from).collect(),
        ..Default::default()
    }
}

#[derive(Clone)]
enum Scripted {
    Respond { status: u16, body: String },
    Fail,
}

/// Fetcher answering from a script, counting calls, switchable offline.
///
/// Unscripted URLs answer 404.
pub(crate) struct ScriptedFetcher {
    script: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
    offline: AtomicBool,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            total: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    fn canonical(url: &str) -> String {
        Request::get(url, &scope()).unwrap().url.to_string()
    }

    pub(crate) fn respond(&self, url: &str, status: u16, body: &str) {
        let entry = Scripted::Respond { status, body: body.into() };
        self.script.lock().unwrap().insert(Self::canonical(url), entry);
    }

    pub(crate) fn fail(&self, url: &str) {
        self.script.lock().unwrap().insert(Self::canonical(url), Scripted::Fail);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub(crate) fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(&Self::canonical(url)).copied().unwrap_or(0)
    }

    /// Script every precache entry of `config` with a 200 response.
    pub(crate) fn script_manifest(&self, config: &AppConfig) {
        for entry in &config.precache {
            self.respond(entry, 200, &format!("precached {entry}"));
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkFailure> {
        let url = request.url.to_string();
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(url.clone()).or_default() += 1;

        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkFailure::Connect(format!("offline: {url}")));
        }

        let scripted = self.script.lock().unwrap().get(&url).cloned();
        let (status, body) = match scripted {
            Some(Scripted::Fail) => return Err(NetworkFailure::Connect(format!("unreachable: {url}"))),
            Some(Scripted::Respond { status, body }) => (status, body),
            None => (404, "not found".to_string()),
        };

        let kind = if same_origin(&scope(), &request.url) {
            ResponseKind::Basic
        } else if request.mode == RequestMode::NoCors {
            ResponseKind::Opaque
        } else {
            ResponseKind::Cors
        };

        if kind == ResponseKind::Opaque {
            return Ok(Response::opaque(request.url.clone()));
        }

        Ok(Response::new(status, body).with_kind(kind).with_url(request.url.clone()))
    }
}

/// Which storage operations should fail.
#[derive(Default)]
pub(crate) struct Faults {
    pub(crate) list: AtomicBool,
    pub(crate) get: AtomicBool,
    pub(crate) put: AtomicBool,
    delete: Mutex<HashSet<String>>,
}

impl Faults {
    pub(crate) fn fail_delete(&self, name: &str) {
        self.delete.lock().unwrap().insert(name.to_string());
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), Error> {
        if flag.load(Ordering::SeqCst) {
            return Err(Error::InvalidInput(format!("injected {what} failure")));
        }
        Ok(())
    }
}

/// SQLite storage that fails the operations named in its [`Faults`].
pub(crate) struct FaultyStorage {
    inner: CacheDb,
    pub(crate) faults: Arc<Faults>,
}

impl FaultyStorage {
    pub(crate) fn new(inner: CacheDb) -> Self {
        Self { inner, faults: Arc::new(Faults::default()) }
    }
}

#[async_trait::async_trait]
impl CacheStorage for FaultyStorage {
    async fn open_store(&self, name: &str) -> Result<Arc<dyn CacheStore>, Error> {
        let inner = self.inner.open_store(name).await?;
        Ok(Arc::new(FaultyStore { inner, faults: self.faults.clone() }))
    }

    async fn has_store(&self, name: &str) -> Result<bool, Error> {
        self.inner.has_store(name).await
    }

    async fn list_store_names(&self) -> Result<Vec<String>, Error> {
        Faults::check(&self.faults.list, "list")?;
        self.inner.list_store_names().await
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        if self.faults.delete.lock().unwrap().contains(name) {
            return Err(Error::InvalidInput(format!("injected delete failure for {name}")));
        }
        self.inner.delete_store(name).await
    }

    async fn mark_activated(&self, name: &str) -> Result<bool, Error> {
        self.inner.mark_activated(name).await
    }

    async fn is_activated(&self, name: &str) -> Result<bool, Error> {
        self.inner.is_activated(name).await
    }
}

/// Store handle sharing its parent's [`Faults`].
pub(crate) struct FaultyStore {
    inner: Arc<dyn CacheStore>,
    faults: Arc<Faults>,
}

impl FaultyStore {
    pub(crate) async fn open(db: &CacheDb, name: &str) -> (Self, Arc<Faults>) {
        let faults = Arc::new(Faults::default());
        let inner = db.open_store(name).await.unwrap();
        (Self { inner, faults: faults.clone() }, faults)
    }
}

#[async_trait::async_trait]
impl CacheStore for FaultyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, key: &RequestKey) -> Result<Option<Snapshot>, Error> {
        Faults::check(&self.faults.get, "read")?;
        self.inner.get(key).await
    }

    async fn put(&self, key: &RequestKey, snapshot: &Snapshot) -> Result<(), Error> {
        Faults::check(&self.faults.put, "write")?;
        self.inner.put(key, snapshot).await
    }

    async fn put_all(&self, entries: &[(RequestKey, Snapshot)]) -> Result<(), Error> {
        Faults::check(&self.faults.put, "write")?;
        self.inner.put_all(entries).await
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        self.inner.delete(key).await
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        self.inner.keys().await
    }
}
