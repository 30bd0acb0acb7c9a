//! Mesh and input fixtures.

use std::sync::Arc;

use hydro_core::{
    FieldLayout, Packages, ParamValue, ParameterInput, Real, StateDescriptor,
};
use hydro_kernel::{FluxKernel, Physics};
use hydro_mesh::{BoundaryKind, Mesh, MeshConfig};

use crate::{ConstTimestep, NoopDerived, ZeroFluxKernel};

/// Parameter input with `<hydro>/eos` and `<hydro>/cfl` set.
pub fn hydro_input() -> ParameterInput {
    ParameterInput::new()
        .with("hydro", "eos", "adiabatic")
        .with("hydro", "cfl", 0.3)
}

/// Package table with a `hydro` package carrying `use_scratch`.
pub fn packages(use_scratch: bool) -> Arc<Packages> {
    let mut hydro = StateDescriptor::new("hydro");
    hydro.add_param("use_scratch", ParamValue::Bool(use_scratch));
    let mut packages = Packages::new();
    packages.add(hydro);
    Arc::new(packages)
}

/// Mesh config of `nblocks` blocks of `block_nx` cells on `[0, 1]`.
pub fn mesh_config(nblocks: usize, block_nx: usize, nghost: usize, bc: BoundaryKind) -> MeshConfig {
    MeshConfig {
        nx: nblocks * block_nx,
        block_nx,
        nghost,
        x_min: 0.0,
        x_max: 1.0,
        inner_bc: bc,
        outer_bc: bc,
    }
}

/// Mesh of `nblocks` blocks of 4 cells with 2 ghosts and outflow edges.
pub fn small_mesh(nblocks: usize, layout: FieldLayout, use_scratch: bool) -> Mesh {
    Mesh::new(
        mesh_config(nblocks, 4, 2, BoundaryKind::Outflow),
        layout,
        packages(use_scratch),
    )
    .expect("fixture mesh config is valid")
}

/// Physics of `flux` with no derived fields and a constant timestep.
pub fn physics_with(flux: Arc<dyn FluxKernel>, dt: Real) -> Physics {
    Physics::new(
        flux,
        Arc::new(NoopDerived::new(0)),
        Arc::new(ConstTimestep::new(dt)),
    )
}

/// Zero-flux physics for `nvar` variables.
pub fn zero_physics(nvar: usize, dt: Real) -> Physics {
    physics_with(Arc::new(ZeroFluxKernel::new(nvar)), dt)
}

/// Fill every cell of every block's base slot with `f(block, var, cell)`.
pub fn fill_base(mesh: &Mesh, f: impl Fn(usize, usize, usize) -> Real) {
    for (b, handle) in mesh.blocks().iter().enumerate() {
        let mut block = handle.lock().expect("fixture block lock");
        let base = block.slots_mut().base_mut();
        for v in 0..base.nvar() {
            for (i, value) in base.var_mut(v).iter_mut().enumerate() {
                *value = f(b, v, i);
            }
        }
    }
}
