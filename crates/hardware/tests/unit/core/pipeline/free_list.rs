//! # Free List
//!
//! Registers come back out in the order they were released, and misuse of the
//! list is reported instead of corrupting it.

use o3sim_core::common::{PhysRegId, RegClass, SimError};
use o3sim_core::core::pipeline::free_list::FreeList;
use pretty_assertions::assert_eq;

fn reg(class: RegClass, index: u32, flat: u32) -> PhysRegId {
    PhysRegId { class, index, flat }
}

/// Allocation is first in, first out within a class.
#[test]
fn fifo_order() {
    let mut fl = FreeList::new(4);
    for i in 0..3 {
        fl.release(reg(RegClass::Int, i, i)).unwrap();
    }
    assert_eq!(fl.allocate(RegClass::Int).unwrap().index, 0);
    assert_eq!(fl.allocate(RegClass::Int).unwrap().index, 1);
    assert_eq!(fl.num_free(RegClass::Int), 1);
}

/// An empty class is an error naming the class.
#[test]
fn exhaustion_is_an_error() {
    let mut fl = FreeList::new(1);
    assert_eq!(
        fl.allocate(RegClass::Float),
        Err(SimError::FreeListExhausted {
            class: RegClass::Float
        })
    );
}

/// Releasing a free register is caught and leaves the list usable.
#[test]
fn double_free_detected() {
    let mut fl = FreeList::new(2);
    let r = reg(RegClass::Int, 1, 1);
    fl.release(r).unwrap();
    assert_eq!(fl.release(r), Err(SimError::DoubleFree { reg: r }));

    let again = fl.allocate(RegClass::Int).unwrap();
    assert!(!fl.is_free(again));
    fl.release(again).unwrap();
}

/// Taking a whole class also clears its free bits.
#[test]
fn take_class_clears_bitmap() {
    let mut fl = FreeList::new(3);
    fl.release(reg(RegClass::Vec, 0, 0)).unwrap();
    fl.release(reg(RegClass::Vec, 1, 1)).unwrap();
    let taken = fl.take_class(RegClass::Vec);
    assert_eq!(taken.len(), 2);
    assert_eq!(fl.num_free(RegClass::Vec), 0);
    assert!(!fl.is_free(taken[0]));
}

/// The first class that cannot cover a request is reported.
#[test]
fn short_class_names_starved_class() {
    let mut fl = FreeList::new(4);
    fl.release(reg(RegClass::Int, 0, 0)).unwrap();
    fl.release(reg(RegClass::Float, 0, 1)).unwrap();

    let mut needed = [0; RegClass::COUNT];
    needed[RegClass::Int.idx()] = 1;
    needed[RegClass::Float.idx()] = 2;
    assert_eq!(fl.short_class(&needed), Some(RegClass::Float));
    assert!(!fl.can_allocate(&needed));

    needed[RegClass::Float.idx()] = 1;
    assert_eq!(fl.short_class(&needed), None);
    assert!(fl.can_allocate(&needed));
}
