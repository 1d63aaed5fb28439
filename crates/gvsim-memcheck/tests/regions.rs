use gvsim_core::Observable;
use gvsim_memcheck::Memcheck;

#[test]
fn observable_tracks_region_and_allocation_counts() {
    let mut mc = Memcheck::new();
    assert_eq!(mc.query("open_regions").unwrap().to_string(), "0");

    mc.mem_open(4, 0x4000, 0x1000, 0xA000_0000).unwrap();
    assert_eq!(mc.query("open_regions").unwrap().to_string(), "1");
    assert_eq!(mc.query("allocations.4").unwrap().to_string(), "0");

    mc.mem_alloc(4, 0x4010, 0x10).unwrap();
    assert_eq!(mc.query("allocations.4").unwrap().to_string(), "1");
}

#[test]
fn multiple_regions_are_independent() {
    let mut mc = Memcheck::new();
    mc.mem_open(1, 0x1000, 0x1000, 0x8000_0000).unwrap();
    mc.mem_open(2, 0x2000, 0x1000, 0x9000_0000).unwrap();

    let a = mc.mem_alloc(1, 0x1000, 0x10).unwrap();
    let b = mc.mem_alloc(2, 0x2000, 0x10).unwrap();
    assert_eq!(a, 0x8000_0000);
    assert_eq!(b, 0x9000_0000);

    // freeing in region 1 must not disturb region 2's bookkeeping.
    mc.mem_free(1, 0x1000, 0x10).unwrap();
    assert_eq!(mc.query("allocations.1").unwrap().to_string(), "0");
    assert_eq!(mc.query("allocations.2").unwrap().to_string(), "1");
}
