#![allow(unused, dead_code)]
use core::arch::asm;

/// Size of the demo stack, in bytes.
const SSIZE: isize = 48;

/// Minimal CPU state: a stack pointer.
///
/// `cothread`'s real `TaskContext` (see `cothread::context`) extends this with
/// the callee-saved registers needed to resume *back* into the original
/// caller. This demo only ever switches one way, so a bare `rsp` is enough to
/// show how a stack is primed.
#[cfg(all(target_arch = "x86_64", target_family = "unix"))]
#[derive(Debug, Default)]
#[repr(C)]
struct ThreadContext {
    rsp: u64,
}

fn hello() -> ! {
    println!("I WAKEUP ON A NEW STACK");
    loop {}
}

/// Loads `new.rsp` into the stack pointer register and executes `ret`.
///
/// Since `rsp` now points at whatever was written to the top of the primed
/// stack, `ret` pops that value into the instruction pointer instead of
/// returning to this function's caller.
#[cfg(all(target_arch = "x86_64", target_family = "unix"))]
unsafe fn gt_switch(new: *const ThreadContext) {
    asm!(
        "mov rsp, [{0} + 0x00]",
        "ret",
        in(reg) new
    )
}

#[cfg(all(target_arch = "aarch64", target_family = "unix"))]
unsafe fn gt_switch(new: *const ThreadContext) {
    unimplemented!("not implemented for aarch64")
}

fn main() {
    let mut ctx = ThreadContext::default();
    let mut stack = vec![0_u8; SSIZE as usize];

    unsafe {
        // Stack grows downwards; start from the (16-byte aligned) base.
        let stack_bottom = stack.as_mut_ptr().offset(SSIZE);
        let sb_aligned = (stack_bottom as usize & !15) as *mut u8;

        // Write the resume target 16 bytes below the aligned base.
        std::ptr::write(sb_aligned.offset(-16) as *mut u64, hello as u64);
        ctx.rsp = sb_aligned.offset(-16) as u64;

        println!("entry point address: {:#x}", hello as u64);
        println!("primed stack pointer: {:#x}", ctx.rsp);

        gt_switch(&mut ctx);
    }
}
