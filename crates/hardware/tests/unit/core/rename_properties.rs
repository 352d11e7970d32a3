//! # Register Lifecycle Properties
//!
//! Random interleavings of rename, commit and squash must never leak, double
//! free, or leave an architectural register unmapped.

use o3sim_core::common::{RegClass, RegId, SeqNum};
use o3sim_core::core::pipeline::stages::RenameStatus;
use o3sim_core::sim::source::StaticInst;
use proptest::prelude::*;

use crate::common::harness::{RenameContext, small_config};

#[derive(Clone, Debug)]
enum Op {
    Rename { dest: u16, src: u16 },
    Commit,
    /// Squash after the in-flight instruction at this fraction of the window.
    Squash(u8),
    CleanUp,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u16..4, 0u16..4).prop_map(|(dest, src)| Op::Rename { dest, src }),
        2 => Just(Op::Commit),
        1 => any::<u8>().prop_map(Op::Squash),
        1 => Just(Op::CleanUp),
    ]
}

fn check_invariants(ctx: &RenameContext) -> Result<(), TestCaseError> {
    prop_assert!(ctx.state.check_conservation().is_ok());
    for index in 0..4 {
        prop_assert!(ctx.state.rename_maps[0].lookup(RegId::int(index)).is_ok());
        prop_assert!(ctx.state.commit_maps[0].lookup(RegId::int(index)).is_ok());
    }
    Ok(())
}

proptest! {
    #[test]
    fn test_conservation_and_totality(ops in proptest::collection::vec(op(), 1..120)) {
        let mut ctx = RenameContext::new(&small_config());
        let total = ctx.state.regfile.num_regs(RegClass::Int);

        for op in ops {
            match op {
                Op::Rename { dest, src } => {
                    let inst = StaticInst::alu(RegId::int(dest), &[RegId::int(src)], 0);
                    let (seq, status) = ctx.rename(0, inst);
                    if status != RenameStatus::Renamed {
                        // Never renamed, so it holds nothing to undo.
                        let _ = ctx.state.squash_thread_after(0, seq - 1, None).unwrap();
                    }
                }
                Op::Commit => {
                    let _ = ctx.commit_head(0);
                }
                Op::Squash(frac) => {
                    let rob: Vec<SeqNum> = ctx.state.rob.iter(0).collect();
                    if let Some(first) = rob.first() {
                        let idx = usize::from(frac) * rob.len() / 256;
                        let anchor = if idx == 0 { first - 1 } else { rob[idx - 1] };
                        let _ = ctx.state.squash_thread_after(0, anchor, None).unwrap();
                    }
                }
                Op::CleanUp => {
                    let _ = ctx.state.inst_list.clean_up();
                }
            }
            check_invariants(&ctx)?;
        }

        while ctx.commit_head(0).is_some() {}
        check_invariants(&ctx)?;
        prop_assert_eq!(ctx.state.free_list.num_free(RegClass::Int), total - 4);
    }

    #[test]
    fn test_no_double_free_after_full_squash(dests in proptest::collection::vec(0u16..4, 1..6)) {
        let mut ctx = RenameContext::new(&small_config());
        let first = ctx.state.global_seq;
        let mut allocated = Vec::new();
        for dest in dests {
            let seq = ctx.write(0, dest);
            let inst = ctx.state.inst_list.get(seq).unwrap();
            allocated.push(inst.records[0].new);
        }

        let _ = ctx.state.squash_thread_after(0, first - 1, None).unwrap();
        for reg in &allocated {
            prop_assert!(ctx.state.free_list.is_free(*reg));
            prop_assert!(ctx.state.free_list.release(*reg).is_err());
        }
        prop_assert_eq!(ctx.state.free_list.num_free(RegClass::Int), 6);
    }
}
