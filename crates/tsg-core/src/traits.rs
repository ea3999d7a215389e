use crate::error::Result;

/// The flat coefficient interface consumed by optimizers.
///
/// `set_dofs(&get_dofs())` must reproduce every free coefficient exactly, and
/// any successful `set_dofs` must invalidate all quantities derived from the dofs.
pub trait Optimizable {
    fn num_dofs(&self) -> usize;

    fn get_dofs(&self) -> Vec<f64>;

    /// Fails with [`crate::TsgError::Dimension`] if `dofs.len() != self.num_dofs()`.
    fn set_dofs(&mut self, dofs: &[f64]) -> Result<()>;

    /// Human readable names aligned with [`Optimizable::get_dofs`].
    fn dof_names(&self) -> Vec<String>;
}

/// Drop all memoized quantities of an object.
pub trait Invalidate {
    fn invalidate_cache(&self);
}
