use gvsim_decode::CpuContext;
use gvsim_event::EventQueue;

use crate::syscall;
use crate::vcpu::Vcpu;

/// Bridges `gvsim-decode`'s queue-less `CpuContext` trait to a `Vcpu` that
/// needs `&mut EventQueue` to issue data-path bus requests. Built fresh for
/// the duration of a single handler invocation and dropped immediately
/// after — it never outlives `run_one`, so it never needs to be `'static`
/// the way the fetch-path continuations do.
pub(crate) struct ExecCtx<'a> {
    pub(crate) vcpu: &'a mut Vcpu,
    pub(crate) queue: &'a mut EventQueue,
}

impl CpuContext for ExecCtx<'_> {
    fn reg(&self, idx: u8) -> u32 {
        self.vcpu.reg(idx)
    }

    fn set_reg(&mut self, idx: u8, value: u32) {
        self.vcpu.set_reg(idx, value);
    }

    fn load_word(&mut self, addr: u32) -> u32 {
        self.vcpu.data_access(self.queue, addr, 4, None)
    }

    fn store_word(&mut self, addr: u32, value: u32) {
        self.vcpu.data_access(self.queue, addr, 4, Some(value));
    }

    fn csr_read(&mut self, addr: u32) -> Option<u32> {
        self.vcpu.csr.read(addr)
    }

    fn csr_write(&mut self, addr: u32, value: u32) -> bool {
        self.vcpu.csr.write(addr, value)
    }

    fn syscall(&mut self, number: u32, args: [u32; 3]) -> u32 {
        syscall::dispatch(self.vcpu, number, args)
    }

    fn account_event(&mut self, index: usize, delta: u64) {
        self.vcpu.csr.account(index, delta);
    }

    fn trap_illegal(&mut self) {
        self.vcpu.trap_pending = Some(gvsim_decode::ILLEGAL_INSTRUCTION_CAUSE);
    }
}
