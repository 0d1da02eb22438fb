pub mod imaginary_axis;
pub mod residue;
