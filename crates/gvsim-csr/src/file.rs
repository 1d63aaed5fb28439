use gvsim_core::{Observable, Value};

/// Number of performance counter slots in the bank.
pub const NB_EVENTS: usize = 32;
/// Slots below this index are maintained by the execution core every tick;
/// the rest are polled from external probes.
pub const NB_INTERNAL_EVENTS: usize = 8;
/// `pcmr` bit that enables the counter bank. Clearing it freezes counting
/// without blocking reads.
pub const PCMR_ACTIVE: u32 = 1 << 0;
/// Hardware-loop register file size (two loops, three registers each:
/// start, end, count).
pub const HWLOOP_NB_REGS: usize = 6;

const CSR_MSTATUS: u32 = 0x300;
const CSR_MISA: u32 = 0x301;
const CSR_MTVEC: u32 = 0x305;
const CSR_MSCRATCH: u32 = 0x340;
const CSR_MEPC: u32 = 0x341;
const CSR_MCAUSE: u32 = 0x342;
const CSR_MHARTID: u32 = 0xF14;
const CSR_DCSR: u32 = 0x7B0;
const CSR_DEPC: u32 = 0x7B1;
const CSR_SCRATCH0: u32 = 0x7B2;
const CSR_SCRATCH1: u32 = 0x7B3;
const CSR_PCER: u32 = 0x7A0;
const CSR_PCMR: u32 = 0x7A1;
const CSR_PCCR_BASE: u32 = 0x780;

/// The register file plus performance counter bank.
///
/// Two access paths, per the core's contract: direct field mutation from
/// the execution core (cycle accounting, trap entry), and `read`/`write`
/// for guest CSR instructions, which only see the subset mapped to an
/// address.
#[derive(Debug, Clone)]
pub struct Csr {
    pub status: u32,
    pub epc: u32,
    pub depc: u32,
    pub dcsr: u32,
    pub mtvec: u32,
    pub mcause: u32,
    pub mscratch: u32,
    pub scratch0: u32,
    pub scratch1: u32,
    pub misa: u32,
    pub mhartid: u32,
    pub fcsr: u32,
    pub hwloop_regs: [u32; HWLOOP_NB_REGS],
    pccr: [u64; NB_EVENTS],
    pcer: u32,
    pcmr: u32,
}

impl Csr {
    #[must_use]
    pub fn new(mhartid: u32) -> Self {
        let mut csr = Self {
            status: 0,
            epc: 0,
            depc: 0,
            dcsr: 0,
            mtvec: 0,
            mcause: 0,
            mscratch: 0,
            scratch0: 0,
            scratch1: 0,
            misa: 0,
            mhartid,
            fcsr: 0,
            hwloop_regs: [0; HWLOOP_NB_REGS],
            pccr: [0; NB_EVENTS],
            pcer: 0,
            pcmr: 0,
        };
        csr.reset();
        csr
    }

    /// Resets architectural state; `mhartid` is a construction-time
    /// identity and survives reset.
    pub fn reset(&mut self) {
        self.status = 0;
        self.epc = 0;
        self.depc = 0;
        self.dcsr = 0;
        self.mtvec = 0;
        self.mcause = 0;
        self.mscratch = 0;
        self.scratch0 = 0;
        self.scratch1 = 0;
        self.fcsr = 0;
        self.hwloop_regs = [0; HWLOOP_NB_REGS];
        self.pccr = [0; NB_EVENTS];
        self.pcer = 0;
        self.pcmr = 0;
    }

    #[must_use]
    pub fn active(&self) -> bool {
        self.pcmr & PCMR_ACTIVE != 0
    }

    #[must_use]
    pub fn pcer(&self) -> u32 {
        self.pcer
    }

    #[must_use]
    pub fn pcmr(&self) -> u32 {
        self.pcmr
    }

    #[must_use]
    pub fn event_enabled(&self, index: usize) -> bool {
        index < NB_EVENTS && self.pcer & (1 << index) != 0
    }

    #[must_use]
    pub fn pccr(&self, index: usize) -> u64 {
        self.pccr.get(index).copied().unwrap_or(0)
    }

    /// Adds `delta` to counter `index`, gated by `pcmr.ACTIVE` and the
    /// corresponding `pcer` enable bit. A disabled or out-of-range event is
    /// silently a no-op, matching the bank's "freeze, don't trap" contract.
    pub fn account(&mut self, index: usize, delta: u64) {
        if index < NB_EVENTS && self.active() && self.event_enabled(index) {
            self.pccr[index] = self.pccr[index].wrapping_add(delta);
        }
    }

    /// Charges the per-tick cycle counter and folds in samples polled from
    /// external probes for the slots beyond `NB_INTERNAL_EVENTS`.
    pub fn account_cycles(&mut self, cycles: u64, external_samples: &[u64]) {
        self.account(super::event::CYCLES, cycles);
        for (offset, &sample) in external_samples.iter().enumerate() {
            self.account(NB_INTERNAL_EVENTS + offset, sample);
        }
    }

    /// Guest CSR read, by RISC-V-style address. `None` for an address this
    /// register file does not map (the caller should raise an illegal
    /// instruction trap).
    #[must_use]
    pub fn read(&self, addr: u32) -> Option<u32> {
        if (CSR_PCCR_BASE..CSR_PCCR_BASE + NB_EVENTS as u32).contains(&addr) {
            return Some(self.pccr((addr - CSR_PCCR_BASE) as usize) as u32);
        }
        Some(match addr {
            CSR_MSTATUS => self.status,
            CSR_MISA => self.misa,
            CSR_MTVEC => self.mtvec,
            CSR_MSCRATCH => self.mscratch,
            CSR_MEPC => self.epc,
            CSR_MCAUSE => self.mcause,
            CSR_MHARTID => self.mhartid,
            CSR_DCSR => self.dcsr,
            CSR_DEPC => self.depc,
            CSR_SCRATCH0 => self.scratch0,
            CSR_SCRATCH1 => self.scratch1,
            CSR_PCER => self.pcer,
            CSR_PCMR => self.pcmr,
            _ => return None,
        })
    }

    /// Guest CSR write. Returns `false` for an unmapped address.
    pub fn write(&mut self, addr: u32, value: u32) -> bool {
        if (CSR_PCCR_BASE..CSR_PCCR_BASE + NB_EVENTS as u32).contains(&addr) {
            self.pccr[(addr - CSR_PCCR_BASE) as usize] = u64::from(value);
            return true;
        }
        match addr {
            CSR_MSTATUS => self.status = value,
            CSR_MISA => self.misa = value,
            CSR_MTVEC => self.mtvec = value,
            CSR_MSCRATCH => self.mscratch = value,
            CSR_MEPC => self.epc = value,
            CSR_MCAUSE => self.mcause = value,
            CSR_MHARTID => {}
            CSR_DCSR => self.dcsr = value,
            CSR_DEPC => self.depc = value,
            CSR_SCRATCH0 => self.scratch0 = value,
            CSR_SCRATCH1 => self.scratch1 = value,
            CSR_PCER => self.pcer = value,
            CSR_PCMR => self.pcmr = value,
            _ => return false,
        }
        true
    }
}

impl Observable for Csr {
    fn query(&self, path: &str) -> Option<Value> {
        Some(match path {
            "status" => Value::U32(self.status),
            "epc" => Value::U32(self.epc),
            "depc" => Value::U32(self.depc),
            "dcsr" => Value::U32(self.dcsr),
            "mtvec" => Value::U32(self.mtvec),
            "mcause" => Value::U32(self.mcause),
            "mscratch" => Value::U32(self.mscratch),
            "mhartid" => Value::U32(self.mhartid),
            "pcer" => Value::U32(self.pcer),
            "pcmr" => Value::U32(self.pcmr),
            "active" => Value::Bool(self.active()),
            "pccr" => Value::Array(self.pccr.iter().map(|&c| Value::U64(c)).collect()),
            _ => return None,
        })
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "status", "epc", "depc", "dcsr", "mtvec", "mcause", "mscratch", "mhartid", "pcer",
            "pcmr", "active", "pccr",
        ]
    }
}
