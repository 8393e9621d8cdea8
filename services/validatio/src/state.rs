use std::{collections::HashMap, sync::Arc};

use annotation::{AnnotationSession, Store};
use kv::Storage;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::object_store::ObjectStore;
use crate::provider::KippProvider;

pub type AppStore = Store<Box<dyn Storage>>;

pub type SharedState = Arc<AppState>;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<RwLock<AppStore>>,
    /// One live session per task; lock after `store` when both are needed.
    pub sessions: Arc<RwLock<HashMap<Uuid, AnnotationSession>>>,
    pub objects: Arc<dyn ObjectStore>,
    pub kipp: Arc<dyn KippProvider>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        storage: Box<dyn Storage>,
        objects: Arc<dyn ObjectStore>,
        kipp: Arc<dyn KippProvider>,
    ) -> Self {
        Self {
            config,
            store: Arc::new(RwLock::new(Store::open(storage))),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            objects,
            kipp,
        }
    }
}
