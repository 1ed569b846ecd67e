use std::sync::Arc;

use kdiag_core::config::AdminSettings;
use kdiag_core::{CommandRegistry, Dispatcher, KeeperService, MemoryKeeper, Reply};

/// Dispatcher over the standard command set and a fresh in-memory keeper
#[allow(dead_code)]
pub fn standard_dispatcher(allow_list: &str) -> (Dispatcher, Arc<MemoryKeeper>) {
    keeper_dispatcher(MemoryKeeper::new(), allow_list)
}

/// Dispatcher over the standard command set and the given keeper
#[allow(dead_code)]
pub fn keeper_dispatcher(keeper: MemoryKeeper, allow_list: &str) -> (Dispatcher, Arc<MemoryKeeper>) {
    let keeper = Arc::new(keeper);
    let registry = CommandRegistry::standard(
        keeper.as_ref(),
        &AdminSettings::with_allow_list(allow_list),
    )
    .unwrap();
    let service: Arc<dyn KeeperService> = keeper.clone();
    (Dispatcher::new(Arc::new(registry), service), keeper)
}

/// Dispatch a name and return the reply text, panicking on silence
#[allow(dead_code)]
pub fn run_text(dispatcher: &Dispatcher, name: &str) -> String {
    match dispatcher.dispatch(token(name)) {
        Reply::Text(text) => text,
        Reply::Silence => panic!("{} replied with silence", name),
    }
}

#[allow(dead_code)]
pub fn token(name: &str) -> [u8; 4] {
    name.as_bytes().try_into().unwrap()
}

/// Value of a `key<TAB>value` row
#[allow(dead_code)]
pub fn stat_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines().find_map(|line| {
        let (k, v) = line.split_once('\t')?;
        (k == key).then_some(v)
    })
}
