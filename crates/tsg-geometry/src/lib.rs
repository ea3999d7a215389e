//! Fourier curves and toroidal surfaces with exact derivatives with respect to
//! their coefficients, conversions between surface representations and
//! cross-section extraction.

pub mod basis;
pub mod convert;
pub mod curve;
pub mod surface;
pub mod table;

pub use curve::{Curve, CurveXYZFourier, FrenetFrame, RotatedCurve};
pub use surface::{
    AnySurface, Garabedian, RzFourier, Surface, SurfaceBasis, SurfaceGarabedian,
    SurfaceRZFourier, SurfaceXYZFourier, XyzFourier,
};
