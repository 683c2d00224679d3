use real3d_ngin::{error::FaultKind, render::PrimitiveKind};

use crate::common::test_utils::{MemoryImage, NodeSpec, PolygonSpec, STOP, recording_context};
mod common;

const ENTRY: u32 = 0x80_0040;
const MATRICES: u32 = 0x80_0300;
const RAM_MODEL: u32 = 0x100_0000;
const ROM_MODEL: u32 = 0x180_0000;

const Q0: [f32; 3] = [0.0, 0.0, 0.0];
const Q1: [f32; 3] = [4.0, 0.0, 0.0];
const Q2: [f32; 3] = [4.0, 4.0, 0.0];
const Q3: [f32; 3] = [0.0, 4.0, 0.0];

fn scene(child: u32) -> MemoryImage {
    let mut memory = MemoryImage::new();
    memory.descriptor(0, STOP, ENTRY & 0xFFFF, MATRICES);
    memory.node(ENTRY, &NodeSpec::child(child));
    memory
}

/// Eye-space positions with the handedness flip undone.
fn model_space(positions: &[[f32; 3]]) -> Vec<[f32; 3]> {
    positions.iter().map(|&[x, y, z]| [x, y, -z]).collect()
}

#[test]
fn should_carry_vertices_between_polygons() {
    let mut memory = scene(RAM_MODEL);
    memory.model(
        RAM_MODEL,
        &[
            PolygonSpec::quad([1, 0, 0], [Q0, Q1, Q2, Q3]),
            // slots 0 and 1 from the quad
            PolygonSpec::triangle([2, 0, 0], [[0.0; 3]; 3])
                .reusing(0x3)
                .with_vertices(&[[8.0, 0.0, 0.0]]),
            // slot 2 from the triangle, slot 3 still from the quad
            PolygonSpec::triangle([3, 0, 0], [[0.0; 3]; 3])
                .reusing(0xC)
                .with_vertices(&[[8.0, 8.0, 0.0]]),
        ],
    );

    let mut ctx = recording_context();
    ctx.update_frame(&memory.map());

    let draws = ctx.backend().draws();
    assert_eq!(draws.len(), 3);
    assert_eq!(draws[0].kind, PrimitiveKind::Quad);
    assert_eq!(model_space(&draws[0].positions), vec![Q0, Q1, Q2, Q3]);
    assert_eq!(
        model_space(&draws[1].positions),
        vec![Q0, Q1, [8.0, 0.0, 0.0]]
    );
    assert_eq!(
        model_space(&draws[2].positions),
        vec![[8.0, 0.0, 0.0], Q3, [8.0, 8.0, 0.0]]
    );
    assert_eq!(ctx.stats().quads, 1);
    assert_eq!(ctx.stats().triangles, 2);
}

#[test]
fn should_decode_big_endian_rom_model() {
    let mut memory = scene(ROM_MODEL);
    memory.model(
        ROM_MODEL,
        &[PolygonSpec::triangle(
            [0xAB, 0xCD, 0xEF],
            [[-1.5, 0.25, 2.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        )],
    );

    let mut ctx = recording_context();
    ctx.update_frame(&memory.map());

    let draws = ctx.backend().draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].color, [0xAB, 0xCD, 0xEF]);
    assert_eq!(model_space(&draws[0].positions)[0], [-1.5, 0.25, 2.0]);
}

#[test]
fn should_treat_class_three_as_model() {
    let mut memory = scene(0x0300_0000);
    memory.model(RAM_MODEL, &[PolygonSpec::quad([9, 9, 9], [Q0, Q1, Q2, Q3])]);

    let mut ctx = recording_context();
    ctx.update_frame(&memory.map());

    assert_eq!(ctx.backend().draws().len(), 1);
    assert_eq!(ctx.stats().quads, 1);
}

#[test]
fn should_draw_nothing_for_empty_model() {
    let memory = scene(RAM_MODEL);
    let mut ctx = recording_context();
    ctx.update_frame(&memory.map());

    assert!(ctx.backend().draws().is_empty());
    assert_eq!(ctx.stats().models, 1);
    assert_eq!(ctx.stats().total_faults(), 0);
}

#[test]
fn should_stop_model_on_undefined_reuse_code() {
    let mut memory = MemoryImage::new();
    memory.descriptor(0, STOP, ENTRY & 0xFFFF, MATRICES);
    memory.node(ENTRY, &NodeSpec::child(RAM_MODEL).with_next(ENTRY + 0x10));
    memory.node(ENTRY + 0x10, &NodeSpec::child(RAM_MODEL + 0x100));
    memory.model(
        RAM_MODEL,
        &[
            PolygonSpec::triangle([1, 0, 0], [Q0, Q1, Q2]),
            PolygonSpec::triangle([2, 0, 0], [Q0, Q1, Q2]).reusing(0x7),
            PolygonSpec::triangle([3, 0, 0], [Q0, Q1, Q2]),
        ],
    );
    memory.model(
        RAM_MODEL + 0x100,
        &[PolygonSpec::triangle([4, 0, 0], [Q0, Q1, Q2])],
    );

    let mut ctx = recording_context();
    ctx.update_frame(&memory.map());

    let colors: Vec<u8> = ctx.backend().draws().iter().map(|d| d.color[0]).collect();
    // polygons before the fault stay drawn, the sibling is unaffected
    assert_eq!(colors, vec![1, 4]);
    assert_eq!(ctx.stats().fault_count(FaultKind::MalformedNode), 1);
}

#[test]
fn should_redirect_to_rom_model_through_indirection() {
    let mut memory = MemoryImage::new();
    memory.descriptor(0, STOP, ENTRY & 0xFFFF, MATRICES);
    // word 1 carries the tag, word 0 the ROM-model flag and the target
    memory.node(
        ENTRY,
        &NodeSpec::child(0)
            .with_header(0x0080_0010)
            .with_translation([50.0, 0.0, 0.0]),
    );
    memory.word(ENTRY + 1, 0x0100_0000);
    memory.model(
        ROM_MODEL + 0x10,
        &[PolygonSpec::triangle([7, 7, 7], [Q0, Q1, Q2])],
    );

    let mut ctx = recording_context();
    ctx.update_frame(&memory.map());

    let draws = ctx.backend().draws();
    assert_eq!(draws.len(), 1);
    // the redirecting node's own transform is never applied
    assert_eq!(model_space(&draws[0].positions), vec![Q0, Q1, Q2]);
    assert_eq!(ctx.stats().nodes, 1);
}

#[test]
fn should_redirect_to_other_node_through_indirection() {
    let target = 0x60;
    let mut memory = MemoryImage::new();
    memory.descriptor(0, STOP, ENTRY & 0xFFFF, MATRICES);
    memory.node(ENTRY, &NodeSpec::child(0).with_header(0x0100_0000 | target));
    memory.node(
        target,
        &NodeSpec::child(RAM_MODEL).with_translation([0.0, 2.0, 0.0]),
    );
    memory.model(RAM_MODEL, &[PolygonSpec::triangle([5, 5, 5], [Q0, Q1, Q2])]);

    let mut ctx = recording_context();
    ctx.update_frame(&memory.map());

    let draws = ctx.backend().draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(model_space(&draws[0].positions)[0], [0.0, 2.0, 0.0]);
    assert_eq!(ctx.stats().nodes, 2);
}

#[test]
fn should_cap_model_without_last_flag() {
    let mut memory = scene(RAM_MODEL);
    let triangle = PolygonSpec::triangle([1, 1, 1], [Q0, Q1, Q2]);
    // the final record carries the last flag, but the cap is hit first
    memory.model(RAM_MODEL, &vec![triangle; 20]);

    let mut ctx = recording_context();
    ctx.configure(|cfg| cfg.limits.max_polygons_per_model = 5);
    ctx.update_frame(&memory.map());

    assert_eq!(ctx.backend().draws().len(), 5);
    assert_eq!(ctx.stats().fault_count(FaultKind::StreamOverrun), 1);
}
