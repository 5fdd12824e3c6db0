//! Late-bound entry points of the widget host's buffer layer.
//!
//! The host exports its buffer functions under fixed symbol names. The port
//! resolves each symbol the first time it is needed and remembers the answer,
//! including a miss, so a host that lacks a function costs one lookup.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use log::{error, warn};
use crate::engine::errors::ScriptError;
use crate::engine::events::{OutputSink, SignalEvent};

/// Opaque host buffer handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferRef(pub u64);

/// A resolved host function.
#[derive(Clone)]
pub enum BufferEntry {
    Unary(Rc<dyn Fn(BufferRef) -> i32>),
    Sized(Rc<dyn Fn(BufferRef, i32, i32) -> i32>),
    Id(Rc<dyn Fn(BufferRef) -> Option<String>>),
    SignalEmit(Rc<dyn Fn(BufferRef, &SignalEvent) -> i32>),
}

/// Looks host symbols up by name.
pub trait SymbolResolver {
    fn resolve(&self, symbol: &str) -> Option<BufferEntry>;
}

impl SymbolResolver for HashMap<&'static str, BufferEntry> {
    fn resolve(&self, symbol: &str) -> Option<BufferEntry> {
        self.get(symbol).cloned()
    }
}

pub const SYM_LOAD: &str = "buffer_handler_load";
pub const SYM_UNLOAD: &str = "buffer_handler_unload";
pub const SYM_IS_LOADED: &str = "buffer_handler_is_loaded";
pub const SYM_RESIZE: &str = "buffer_handler_resize";
pub const SYM_UPDATE_SIZE: &str = "buffer_handler_update_size";
pub const SYM_ID: &str = "buffer_handler_id";
pub const SYM_LOCK: &str = "buffer_handler_lock";
pub const SYM_UNLOCK: &str = "buffer_handler_unlock";
pub const SYM_FLUSH: &str = "buffer_handler_flush";
pub const SYM_SIGNAL_EMIT: &str = "script_signal_emit";

pub struct BufferAbi<R: SymbolResolver> {
    resolver: R,
    cache: RefCell<HashMap<&'static str, Option<BufferEntry>>>,
}

fn broken(symbol: &str) -> ScriptError {
    ScriptError::NotImplemented(format!("{symbol} is not provided by the host"))
}

impl<R: SymbolResolver> BufferAbi<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn entry(&self, symbol: &'static str) -> Option<BufferEntry> {
        if let Some(cached) = self.cache.borrow().get(symbol) {
            return cached.clone();
        }

        let resolved = self.resolver.resolve(symbol);
        if resolved.is_none() {
            error!("broken ABI: {} is not available", symbol);
        }
        self.cache.borrow_mut().insert(symbol, resolved.clone());
        resolved
    }

    fn unary(&self, symbol: &'static str, buffer: BufferRef) -> Result<i32, ScriptError> {
        match self.entry(symbol) {
            Some(BufferEntry::Unary(f)) => Ok(f(buffer)),
            _ => Err(broken(symbol)),
        }
    }

    fn sized(&self, symbol: &'static str, buffer: BufferRef, w: i32, h: i32) -> Result<i32, ScriptError> {
        match self.entry(symbol) {
            Some(BufferEntry::Sized(f)) => Ok(f(buffer, w, h)),
            _ => Err(broken(symbol)),
        }
    }

    pub fn load(&self, buffer: BufferRef) -> Result<i32, ScriptError> {
        self.unary(SYM_LOAD, buffer)
    }

    pub fn unload(&self, buffer: BufferRef) -> Result<i32, ScriptError> {
        self.unary(SYM_UNLOAD, buffer)
    }

    pub fn is_loaded(&self, buffer: BufferRef) -> Result<i32, ScriptError> {
        self.unary(SYM_IS_LOADED, buffer)
    }

    pub fn resize(&self, buffer: BufferRef, w: i32, h: i32) -> Result<i32, ScriptError> {
        self.sized(SYM_RESIZE, buffer, w, h)
    }

    pub fn update_size(&self, buffer: BufferRef, w: i32, h: i32) -> Result<i32, ScriptError> {
        self.sized(SYM_UPDATE_SIZE, buffer, w, h)
    }

    pub fn id(&self, buffer: BufferRef) -> Result<Option<String>, ScriptError> {
        match self.entry(SYM_ID) {
            Some(BufferEntry::Id(f)) => Ok(f(buffer)),
            _ => Err(broken(SYM_ID)),
        }
    }

    pub fn lock(&self, buffer: BufferRef) -> Result<i32, ScriptError> {
        self.unary(SYM_LOCK, buffer)
    }

    pub fn unlock(&self, buffer: BufferRef) -> Result<i32, ScriptError> {
        self.unary(SYM_UNLOCK, buffer)
    }

    pub fn flush(&self, buffer: BufferRef) -> Result<i32, ScriptError> {
        self.unary(SYM_FLUSH, buffer)
    }

    pub fn signal_emit(&self, buffer: BufferRef, event: &SignalEvent) -> Result<i32, ScriptError> {
        match self.entry(SYM_SIGNAL_EMIT) {
            Some(BufferEntry::SignalEmit(f)) => Ok(f(buffer, event)),
            _ => Err(broken(SYM_SIGNAL_EMIT)),
        }
    }
}

/// Output sink that hands emissions to the host's buffer layer.
pub struct BufferSink<R: SymbolResolver> {
    abi: Rc<BufferAbi<R>>,
    buffer: BufferRef,
}

impl<R: SymbolResolver> BufferSink<R> {
    pub fn new(abi: Rc<BufferAbi<R>>, buffer: BufferRef) -> Self {
        Self { abi, buffer }
    }
}

impl<R: SymbolResolver> OutputSink for BufferSink<R> {
    fn emit_signal(&mut self, event: &SignalEvent) {
        if let Err(e) = self.abi.signal_emit(self.buffer, event) {
            warn!("Dropped {} from {}: {}", event.emission, event.source, e);
        }
    }
}
