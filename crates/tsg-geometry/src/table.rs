//! Coefficient storage shared by the RZ and XYZ surface representations.

use ndarray::{Array2, ArrayViewMut2};
use serde::{Deserialize, Serialize};
use tsg_core::{Result, TsgError};

use crate::basis::{
    evaluate_series, series_jacobian, Component, Mode, Parity, Partial, SurfacePoint,
};

/// One `(mpol+1) × (2·ntor+1)` array of coefficients, indexed `[m, n + ntor]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientBlock {
    pub name: String,
    pub component: Component,
    pub parity: Parity,
    pub values: Array2<f64>,
}

/// Truncated double Fourier series for a set of components.
///
/// Blocks are stored in dof order: for every component its `cos` block then its
/// `sin` block, the latter (or former) omitted entirely under stellarator symmetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FourierTable {
    nfp: u32,
    stellsym: bool,
    mpol: usize,
    ntor: usize,
    blocks: Vec<CoefficientBlock>,
}

impl FourierTable {
    /// Zero table; `components` pairs each component with the letter used in dof names.
    pub fn new(
        nfp: u32,
        stellsym: bool,
        mpol: usize,
        ntor: usize,
        components: &[(Component, char)],
    ) -> Result<Self> {
        if nfp == 0 {
            return Err(TsgError::InvalidParameter("nfp must be positive".into()));
        }
        let mut blocks = Vec::new();
        for &(component, letter) in components {
            for parity in [Parity::Cos, Parity::Sin] {
                if stellsym && parity != component.symmetric_parity() {
                    continue;
                }
                blocks.push(CoefficientBlock {
                    name: format!("{letter}{}", parity.suffix()),
                    component,
                    parity,
                    values: Array2::zeros((mpol + 1, 2 * ntor + 1)),
                });
            }
        }
        Ok(Self {
            nfp,
            stellsym,
            mpol,
            ntor,
            blocks,
        })
    }

    pub fn nfp(&self) -> u32 {
        self.nfp
    }

    pub fn stellsym(&self) -> bool {
        self.stellsym
    }

    pub fn mpol(&self) -> usize {
        self.mpol
    }

    pub fn ntor(&self) -> usize {
        self.ntor
    }

    pub fn blocks(&self) -> &[CoefficientBlock] {
        &self.blocks
    }

    pub fn block(&self, component: Component, parity: Parity) -> Option<&CoefficientBlock> {
        self.blocks
            .iter()
            .find(|b| b.component == component && b.parity == parity)
    }

    fn index(&self, m: i32, n: i32) -> Option<(usize, usize)> {
        let ntor = self.ntor as i32;
        if m < 0 || m > self.mpol as i32 || n.abs() > ntor {
            return None;
        }
        Some((m as usize, (n + ntor) as usize))
    }

    /// Stored coefficient; errors for out-of-window modes and absent blocks.
    pub fn get(&self, component: Component, parity: Parity, m: i32, n: i32) -> Result<f64> {
        let (i, j) = self.index(m, n).ok_or_else(|| {
            TsgError::InvalidParameter(format!(
                "mode ({m},{n}) outside mpol={}, ntor={}",
                self.mpol, self.ntor
            ))
        })?;
        let block = self.block(component, parity).ok_or_else(|| {
            TsgError::Unsupported(format!(
                "{component:?}/{parity:?} coefficients are absent under stellarator symmetry"
            ))
        })?;
        Ok(block.values[[i, j]])
    }

    /// Stored coefficient, reading anything unrepresentable as zero.
    pub fn get_or_zero(&self, component: Component, parity: Parity, m: i32, n: i32) -> f64 {
        self.get(component, parity, m, n).unwrap_or(0.0)
    }

    pub fn set(
        &mut self,
        component: Component,
        parity: Parity,
        m: i32,
        n: i32,
        value: f64,
    ) -> Result<()> {
        if Mode::is_redundant(m, n, parity) {
            return Err(TsgError::InvalidParameter(format!(
                "mode ({m},{n}) with {parity:?} parity is not a free coefficient"
            )));
        }
        let (i, j) = self.index(m, n).ok_or_else(|| {
            TsgError::InvalidParameter(format!(
                "mode ({m},{n}) outside mpol={}, ntor={}",
                self.mpol, self.ntor
            ))
        })?;
        let block = self
            .blocks
            .iter_mut()
            .find(|b| b.component == component && b.parity == parity)
            .ok_or_else(|| {
                TsgError::Unsupported(format!(
                    "{component:?}/{parity:?} coefficients are absent under stellarator symmetry"
                ))
            })?;
        block.values[[i, j]] = value;
        Ok(())
    }

    /// Free modes in dof order with their current coefficients.
    pub fn terms(&self) -> impl Iterator<Item = (Mode, f64)> + '_ {
        let ntor = self.ntor as i32;
        self.blocks.iter().flat_map(move |block| {
            (0..=self.mpol as i32).flat_map(move |m| {
                (-ntor..=ntor).filter_map(move |n| {
                    if Mode::is_redundant(m, n, block.parity) {
                        return None;
                    }
                    let mode = Mode {
                        component: block.component,
                        parity: block.parity,
                        m,
                        n,
                    };
                    Some((mode, block.values[[m as usize, (n + ntor) as usize]]))
                })
            })
        })
    }

    pub fn modes(&self) -> Vec<Mode> {
        self.terms().map(|(mode, _)| mode).collect()
    }

    pub fn num_dofs(&self) -> usize {
        let cells = (self.mpol + 1) * (2 * self.ntor + 1);
        self.blocks
            .iter()
            .map(|b| match b.parity {
                Parity::Cos => cells - self.ntor,
                Parity::Sin => cells - self.ntor - 1,
            })
            .sum()
    }

    pub fn dofs(&self) -> Vec<f64> {
        self.terms().map(|(_, v)| v).collect()
    }

    pub fn set_dofs(&mut self, dofs: &[f64]) -> Result<()> {
        TsgError::check_len(self.num_dofs(), dofs.len())?;
        let ntor = self.ntor as i32;
        let mut values = dofs.iter();
        for block in &mut self.blocks {
            for m in 0..=self.mpol as i32 {
                for n in -ntor..=ntor {
                    if Mode::is_redundant(m, n, block.parity) {
                        continue;
                    }
                    if let Some(&v) = values.next() {
                        block.values[[m as usize, (n + ntor) as usize]] = v;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn dof_names(&self) -> Vec<String> {
        let ntor = self.ntor as i32;
        let mut names = Vec::with_capacity(self.num_dofs());
        for block in &self.blocks {
            for m in 0..=self.mpol as i32 {
                for n in -ntor..=ntor {
                    if !Mode::is_redundant(m, n, block.parity) {
                        names.push(format!("{}({m},{n})", block.name));
                    }
                }
            }
        }
        names
    }

    /// Copy into a new `mpol × ntor` window, zero-filling new modes and dropping
    /// modes outside it.
    pub fn change_resolution(&mut self, mpol: usize, ntor: usize) {
        let m_keep = self.mpol.min(mpol);
        let n_keep = self.ntor.min(ntor) as i32;
        for block in &mut self.blocks {
            let mut values = Array2::zeros((mpol + 1, 2 * ntor + 1));
            for m in 0..=m_keep {
                for n in -n_keep..=n_keep {
                    values[[m, (n + ntor as i32) as usize]] =
                        block.values[[m, (n + self.ntor as i32) as usize]];
                }
            }
            block.values = values;
        }
        self.mpol = mpol;
        self.ntor = ntor;
    }

    pub fn point_at(&self, phi: f64, theta: f64, max_order: usize) -> SurfacePoint {
        evaluate_series(self.terms(), self.nfp, phi, theta, max_order)
    }

    pub fn jacobian_at(&self, phi: f64, theta: f64, partial: Partial, out: ArrayViewMut2<f64>) {
        let modes = self.modes();
        series_jacobian(&modes, self.nfp, phi, theta, partial, out);
    }
}
