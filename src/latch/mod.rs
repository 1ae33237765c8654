use parking_lot::{lock_api::RawRwLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A reader/writer latch. The guard API covers the common scoped case;
/// the raw lock/unlock pairs exist for callers that release a latch in a
/// different expression than the one that acquired it.
#[derive(Debug, Default)]
pub struct Latch {
    lock: RwLock<()>,
}

impl Latch {
    pub fn new() -> Self {
        Self {
            lock: RwLock::new(()),
        }
    }

    #[allow(unused)]
    pub fn rlock(&self) {
        unsafe { self.lock.raw() }.lock_shared();
    }

    #[allow(unused)]
    pub fn runlock(&self) {
        unsafe { self.lock.raw().unlock_shared() };
    }

    #[allow(unused)]
    pub fn wlock(&self) {
        unsafe { self.lock.raw() }.lock_exclusive();
    }

    #[allow(unused)]
    pub fn wunlock(&self) {
        unsafe { self.lock.raw().unlock_exclusive() };
    }

    pub fn rguard(&self) -> RwLockReadGuard<()> {
        self.lock.read()
    }

    pub fn wguard(&self) -> RwLockWriteGuard<()> {
        self.lock.write()
    }

    #[cfg(test)]
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }
}
