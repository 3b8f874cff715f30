//! The simulation engine's reference rule table.
//!
//! 46 implications and 7 derived switches, in their historical order.
//! Flag declaration order (and therefore output order) follows from it.

use crate::error::RuleTableError;
use crate::expr::Expr;
use crate::rules::RuleTable;

/// Build the reference table.
pub fn reference_table() -> RuleTable {
    // The rule list below is fixed and known to validate.
    match build_reference() {
        Ok(table) => table,
        Err(e) => unreachable!("reference rule table is invalid: {}", e),
    }
}

fn build_reference() -> Result<RuleTable, RuleTableError> {
    RuleTable::builder()
        .implies("COLLISION_DETECTION", "GHOST_FLAG")
        .implies("COLLISION_DETECTION", "GHOSTS_HAVE_BONDS")
        .implies("LEES_EDWARDS", "DPD")
        .implies("ENGINE", "ROTATION")
        .implies("ROTATIONAL_INERTIA", "ROTATION")
        .implies("ROTATION_PER_PARTICLE", "ROTATION")
        .implies("MOL_CUT", "VIRTUAL_SITES_COM")
        .implies("INTER_RF", "ELECTROSTATICS")
        .implies("VIRTUAL_SITES_RELATIVE", "ROTATION")
        .implies("THERMOSTAT_IGNORE_NON_VIRTUAL", "VIRTUAL_SITES_THERMOSTAT")
        .implies("TRANS_DPD", "DPD")
        .implies("DPD_MASS", "MASS")
        .implies("DPD_MASS", "DPD")
        .implies("TUNABLE_SLIP", "DPD")
        .implies("LB_BOUNDARIES", "LB")
        .implies("LB_BOUNDARIES", "CONSTRAINTS")
        .implies("LB_BOUNDARIES_GPU", "LB_GPU")
        .implies("LB_BOUNDARIES_GPU", "CONSTRAINTS")
        .implies("LB_ELECTROHYDRODYNAMICS", "LB")
        .implies("ELECTROKINETICS", "LB_GPU")
        .implies("ELECTROKINETICS", "EXTERNAL_FORCES")
        .implies("ELECTROKINETICS", "ELECTROSTATICS")
        .implies("EK_BOUNDARIES", "ELECTROKINETICS")
        .implies("EK_BOUNDARIES", "LB_GPU")
        .implies("EK_BOUNDARIES", "LB_BOUNDARIES_GPU")
        .implies("EK_BOUNDARIES", "CONSTRAINTS")
        .implies("EK_BOUNDARIES", "EXTERNAL_FORCES")
        .implies("EK_BOUNDARIES", "ELECTROSTATICS")
        .implies("EK_REACTION", "ELECTROKINETICS")
        .implies("EK_REACTION", "LB_GPU")
        .implies("EK_REACTION", "EXTERNAL_FORCES")
        .implies("EK_REACTION", "ELECTROSTATICS")
        .implies("EK_ELECTROSTATIC_COUPLING", "ELECTROKINETICS")
        .implies("EK_ELECTROSTATIC_COUPLING", "LB_GPU")
        .implies("EK_ELECTROSTATIC_COUPLING", "ELECTROSTATICS")
        .implies("SHANCHEN", "LB_GPU")
        .implies("SD", "BD")
        .implies("LENNARD_JONES_GENERIC", "LENNARD_JONES")
        .implies("GAY_BERNE", "ROTATION")
        .implies("BOND_ANGLEDIST_HARMONIC", "BOND_ANGLEDIST")
        .implies("BOND_ANGLEDIST_HARMONIC", "CONSTRAINTS")
        .implies("BOND_ENDANGLEDIST_HARMONIC", "BOND_ENDANGLEDIST")
        .implies("BOND_ENDANGLEDIST_HARMONIC", "CONSTRAINTS")
        .implies("CG_DNA", "TWIST_STACK")
        .implies("CG_DNA", "HYDROGEN_BOND")
        .implies("CG_DNA", "COULOMB_DEBYE_HUECKEL")
        // Derived switches
        .derived("P3M", Expr::all_of(["ELECTROSTATICS", "FFTW"]))
        .derived("DP3M", Expr::all_of(["DIPOLES", "FFTW"]))
        .derived(
            "DIPOLAR_DIRECT_SUM",
            Expr::all_of(["DIPOLES", "ROTATION", "CUDA"]),
        )
        .derived(
            "VIRTUAL_SITES",
            Expr::any_of([
                "VIRTUAL_SITES_COM",
                "VIRTUAL_SITES_RELATIVE",
                "IMMERSED_BOUNDARY",
            ]),
        )
        .derived("DPD_MASS", Expr::any_of(["DPD_MASS_RED", "DPD_MASS_LIN"]))
        .derived("LATTICE", Expr::any_of(["LB", "LB_GPU"]))
        .derived(
            "BOND_ANGLE_OLD",
            Expr::any_of([
                "BOND_ANGLE_HARMONIC",
                "BOND_ANGLE_COSINE",
                "BOND_ANGLE_COSSQUARE",
            ]),
        )
        .build()
}
