use pdbtbx::*;

pub trait ResidueExt {
    /// One-letter amino acid code, `None` for anything that is not a standard residue.
    fn resn(&self) -> Option<&str>;
    /// Whether the residue carries an alpha carbon.
    fn has_ca(&self) -> bool;
}

impl ResidueExt for Residue {
    fn resn(&self) -> Option<&str> {
        let aa_code = match self.name()? {
            "ALA" => "A",
            "ARG" => "R",
            "ASN" => "N",
            "ASP" => "D",
            "CYS" => "C",
            "GLN" => "Q",
            "GLU" => "E",
            "GLY" => "G",
            "HIS" | "HID" | "HIE" | "HIP" => "H",
            "ILE" => "I",
            "LEU" => "L",
            "LYS" => "K",
            "MET" | "MSE" => "M",
            "PHE" => "F",
            "PRO" => "P",
            "SER" => "S",
            "THR" => "T",
            "TRP" => "W",
            "TYR" => "Y",
            "VAL" => "V",
            _ => return None,
        };
        Some(aa_code)
    }

    fn has_ca(&self) -> bool {
        self.atoms().any(|a| a.name() == "CA")
    }
}
