use crate::residues::ResidueExt;
use pdbtbx::*;

pub trait ChainExt {
    fn pdb_seq(&self) -> Vec<&str>;
}

impl ChainExt for Chain {
    fn pdb_seq(&self) -> Vec<&str> {
        // Residues are filtered to standard amino acids on load
        self.residues().filter_map(|res| res.resn()).collect()
    }
}
