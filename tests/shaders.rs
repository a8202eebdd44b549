//! Validates the embedded WGSL without touching a GPU.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use prism::render::pipelines::{COMPOSITE_SHADER, RGB_SHIFT_SHADER};

fn validate(label: &str, source: &str) -> naga::Module {
    let module = naga::front::wgsl::parse_str(source)
        .unwrap_or_else(|e| panic!("{label} failed to parse: {e:?}"));
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .unwrap_or_else(|e| panic!("{label} failed validation: {e:?}"));
    module
}

#[test]
fn rgb_shift_shader_is_valid() {
    let module = validate("rgb shift shader", RGB_SHIFT_SHADER);

    let entry_points: Vec<_> = module.entry_points.iter().map(|ep| ep.name.as_str()).collect();
    assert!(entry_points.contains(&"vs_main"));
    assert!(entry_points.contains(&"fs_main"));
}

#[test]
fn composite_shader_is_valid() {
    let module = validate("composite shader", COMPOSITE_SHADER);

    let entry_points: Vec<_> = module.entry_points.iter().map(|ep| ep.name.as_str()).collect();
    assert!(entry_points.contains(&"vs_main"));
    assert!(entry_points.contains(&"fs_main"));
}

#[test]
fn shaders_bind_texture_sampler_and_uniform() {
    for (label, source) in [
        ("rgb shift shader", RGB_SHIFT_SHADER),
        ("composite shader", COMPOSITE_SHADER),
    ] {
        let module = validate(label, source);
        let bindings: Vec<u32> = module
            .global_variables
            .iter()
            .filter_map(|(_, var)| var.binding.as_ref())
            .map(|b| b.binding)
            .collect();

        for expected in [0, 1, 2] {
            assert!(
                bindings.contains(&expected),
                "{label} is missing binding {expected}"
            );
        }
    }
}
