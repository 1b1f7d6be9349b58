// SPDX-License-Identifier: MPL-2.0

use std::sync::{
    Arc, Condvar, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use aster_xdma::{
    DmaDirection, Engine, EngineConfig, Error, PerformanceIoctl, SgdmaCdev, TransferParams,
    TransferSubmitter, UserSpace, Vaddr, error::Result,
};

/// What the mock submitter answers.
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    /// Transfers every requested byte.
    Full,
    /// Transfers at most this many bytes.
    Short(usize),
    /// Fails with this error.
    Fail(Error),
}

/// A one-shot rendezvous that keeps a submission in flight until opened.
#[derive(Debug, Default)]
pub struct Gate {
    // (entered, opened)
    state: Mutex<(bool, bool)>,
    cond: Condvar,
}

impl Gate {
    fn enter_and_wait(&self) {
        let mut state = self.state.lock().unwrap();
        state.0 = true;
        self.cond.notify_all();
        while !state.1 {
            state = self.cond.wait(state).unwrap();
        }
    }

    /// Blocks until a submission is parked at the gate.
    pub fn wait_entered(&self) {
        let mut state = self.state.lock().unwrap();
        while !state.0 {
            state = self.cond.wait(state).unwrap();
        }
    }

    pub fn open(&self) {
        self.state.lock().unwrap().1 = true;
        self.cond.notify_all();
    }
}

#[derive(Debug)]
pub struct MockSubmitter {
    outcome: Mutex<Outcome>,
    gate: Mutex<Option<Arc<Gate>>>,
    pub transfers: Mutex<Vec<TransferParams>>,
    pub perf_sizes: Mutex<Vec<u32>>,
    pub addr_modes: Mutex<Vec<bool>>,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl MockSubmitter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(Outcome::Full),
            gate: Mutex::new(None),
            transfers: Mutex::new(Vec::new()),
            perf_sizes: Mutex::new(Vec::new()),
            addr_modes: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    pub fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    /// Makes the next submissions park until the returned gate is opened.
    pub fn hold(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.lock().unwrap().len()
    }

    pub fn last_transfer(&self) -> TransferParams {
        *self.transfers.lock().unwrap().last().unwrap()
    }

    fn enter(&self) -> Outcome {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.enter_and_wait();
        }

        let outcome = *self.outcome.lock().unwrap();
        self.active.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

impl TransferSubmitter for MockSubmitter {
    fn submit(&self, _engine: &Engine, params: &TransferParams) -> Result<usize> {
        self.transfers.lock().unwrap().push(*params);
        match self.enter() {
            Outcome::Full => Ok(params.length),
            Outcome::Short(max) => Ok(params.length.min(max)),
            Outcome::Fail(err) => Err(err),
        }
    }

    fn submit_performance(&self, _engine: &Engine, perf: &mut PerformanceIoctl) -> Result<()> {
        self.perf_sizes.lock().unwrap().push(perf.transfer_size);
        match self.enter() {
            Outcome::Fail(err) => Err(err),
            _ => {
                perf.iterations = 4;
                perf.clock_cycle_count = 1000;
                perf.data_cycle_count = u64::from(perf.transfer_size) / 8;
                perf.stopped = 1;
                Ok(())
            }
        }
    }

    fn set_address_mode(&self, _engine: &Engine, fixed: bool) {
        self.addr_modes.lock().unwrap().push(fixed);
    }
}

/// A flat, `Vec`-backed address space starting at [`Sandbox::BASE`].
#[derive(Debug)]
pub struct Sandbox {
    mem: Mutex<Vec<u8>>,
}

impl Sandbox {
    pub const BASE: Vaddr = 0x1000_0000;

    pub fn new(size: usize) -> Self {
        Self {
            mem: Mutex::new(vec![0; size]),
        }
    }

    pub fn as_dyn(&self) -> &dyn UserSpace {
        self
    }

    fn range(&self, addr: Vaddr, len: usize) -> Result<std::ops::Range<usize>> {
        let size = self.mem.lock().unwrap().len();
        let start = addr
            .checked_sub(Self::BASE)
            .ok_or(Error::from(aster_xdma::Errno::EFAULT))?;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= size)
            .ok_or(Error::from(aster_xdma::Errno::EFAULT))?;
        Ok(start..end)
    }
}

impl UserSpace for Sandbox {
    fn check_access(&self, addr: Vaddr, len: usize) -> Result<()> {
        self.range(addr, len).map(|_| ())
    }

    fn read_bytes(&self, addr: Vaddr, buf: &mut [u8]) -> Result<()> {
        let range = self.range(addr, buf.len())?;
        buf.copy_from_slice(&self.mem.lock().unwrap()[range]);
        Ok(())
    }

    fn write_bytes(&self, addr: Vaddr, buf: &[u8]) -> Result<()> {
        let range = self.range(addr, buf.len())?;
        self.mem.lock().unwrap()[range].copy_from_slice(buf);
        Ok(())
    }
}

/// Creates the device of a fresh engine on instance 0.
pub fn new_cdev(config: EngineConfig) -> (SgdmaCdev, Arc<MockSubmitter>) {
    let submitter = MockSubmitter::new();
    let engine = Arc::new(Engine::new(config).unwrap());
    let cdev = SgdmaCdev::new(0, engine, submitter.clone());
    (cdev, submitter)
}

pub fn h2c_mm() -> EngineConfig {
    EngineConfig::new(DmaDirection::ToDevice)
}

pub fn c2h_mm() -> EngineConfig {
    EngineConfig::new(DmaDirection::FromDevice)
}
