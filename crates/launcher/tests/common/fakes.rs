//! In-process collaborators recording how the launcher drives them.

use async_trait::async_trait;
use hearth_core::documents::Download;
use hearth_crypto::{ChaChaCipher, SecretKey};
use hearth_launcher::{
    Collaborators, DebridClient, DebridClients, DebridProvider, DownloadAgent, DownloadEngine,
    LaunchError, LaunchResult, MainLoop, ManifestRegistrar, RemoteSync,
};
use hearth_storage::{DocumentStore, MemoryBackend};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[allow(dead_code)]
pub fn memory_store() -> DocumentStore {
    DocumentStore::new(Arc::new(MemoryBackend::new()))
}

#[allow(dead_code)]
pub fn test_cipher() -> Arc<ChaChaCipher> {
    Arc::new(ChaChaCipher::new(&SecretKey::generate()))
}

/// Debrid client accepting every token except `rejected`.
pub struct FakeDebridClient {
    provider: DebridProvider,
    tokens: Mutex<Vec<String>>,
    reject: bool,
    pub verifications: AtomicUsize,
}

impl FakeDebridClient {
    pub fn new(provider: DebridProvider) -> Arc<Self> {
        Arc::new(Self {
            provider,
            tokens: Mutex::new(Vec::new()),
            reject: false,
            verifications: AtomicUsize::new(0),
        })
    }

    #[allow(dead_code)]
    pub fn rejecting(provider: DebridProvider) -> Arc<Self> {
        Arc::new(Self {
            provider,
            tokens: Mutex::new(Vec::new()),
            reject: true,
            verifications: AtomicUsize::new(0),
        })
    }

    #[allow(dead_code)]
    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl DebridClient for FakeDebridClient {
    fn provider(&self) -> DebridProvider {
        self.provider
    }

    async fn authorize(&self, token: &str) -> LaunchResult<()> {
        if self.reject {
            return Err(LaunchError::Authorization {
                provider: self.provider.to_string(),
                message: "rejected".to_string(),
            });
        }
        self.tokens.lock().unwrap().push(token.to_string());
        Ok(())
    }

    fn is_authorized(&self) -> bool {
        !self.tokens.lock().unwrap().is_empty()
    }

    async fn verify(&self) -> LaunchResult<()> {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAgent {
    pub runs: AtomicUsize,
}

#[async_trait]
impl DownloadAgent for FakeAgent {
    async fn run(&self) -> LaunchResult<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Engine recording every `start_rpc` call.
#[derive(Default)]
pub struct FakeEngine {
    pub calls: Mutex<Vec<(Option<Download>, Vec<Download>)>>,
    pub fail: bool,
}

#[async_trait]
impl DownloadEngine for FakeEngine {
    async fn start_rpc(
        &self,
        next: Option<&Download>,
        seeds: &[Download],
        _providers: &DebridClients,
    ) -> LaunchResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((next.cloned(), seeds.to_vec()));
        if self.fail {
            return Err(LaunchError::Engine("rpc unavailable".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSync {
    pub setups: AtomicUsize,
    pub uploads: AtomicUsize,
    pub fail_setup: bool,
}

#[async_trait]
impl RemoteSync for FakeSync {
    async fn setup_api(&self) -> LaunchResult<()> {
        self.setups.fetch_add(1, Ordering::SeqCst);
        if self.fail_setup {
            return Err(LaunchError::Sync("offline".to_string()));
        }
        Ok(())
    }

    async fn upload_games_batch(&self) -> LaunchResult<usize> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }
}

#[derive(Default)]
pub struct FakeRegistrar {
    pub calls: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl ManifestRegistrar for FakeRegistrar {
    async fn add_manifest_to_config(&self) -> LaunchResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LaunchError::Config("ludusavi config unreadable".to_string()));
        }
        Ok(())
    }
}

/// Main loop that returns immediately.
#[derive(Default)]
pub struct FakeMainLoop {
    pub starts: AtomicUsize,
}

#[async_trait]
impl MainLoop for FakeMainLoop {
    async fn start(&self) -> LaunchResult<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Handles on every fake, kept by the test after the launcher takes the
/// trait objects.
pub struct Fakes {
    pub real_debrid: Arc<FakeDebridClient>,
    pub all_debrid: Arc<FakeDebridClient>,
    pub torbox: Arc<FakeDebridClient>,
    pub agent: Arc<FakeAgent>,
    pub engine: Arc<FakeEngine>,
    pub sync: Arc<FakeSync>,
    pub registrar: Arc<FakeRegistrar>,
    pub main_loop: Arc<FakeMainLoop>,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            real_debrid: FakeDebridClient::new(DebridProvider::RealDebrid),
            all_debrid: FakeDebridClient::new(DebridProvider::AllDebrid),
            torbox: FakeDebridClient::new(DebridProvider::TorBox),
            agent: Arc::default(),
            engine: Arc::default(),
            sync: Arc::default(),
            registrar: Arc::default(),
            main_loop: Arc::default(),
        }
    }
}

impl Fakes {
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            providers: DebridClients::new(
                self.real_debrid.clone(),
                self.all_debrid.clone(),
                self.torbox.clone(),
            ),
            agent: self.agent.clone(),
            engine: self.engine.clone(),
            sync: self.sync.clone(),
            registrar: self.registrar.clone(),
            main_loop: self.main_loop.clone(),
        }
    }
}
