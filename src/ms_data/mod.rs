//! Access to a measurement set's processing set, with selections that
//! accumulate until cleared.


use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::{
    axis::Axis,
    ps::{MsSelection, ProcessingSet, PsDim, PsError, PsSelection, SummaryRow, VisStats},
    raster::{raster_data, ColorMode, RasterData, RasterError, RasterInputs},
    read::{DataGroup, MsReader},
};

struct PsData {
    original: ProcessingSet,

    /// `None` until something is selected.
    selected: Option<ProcessingSet>,
}

impl PsData {
    fn current(&self) -> &ProcessingSet {
        self.selected.as_ref().unwrap_or(&self.original)
    }
}

/// A measurement set, or nothing. Without data every accessor logs that
/// there's no path and returns nothing.
pub struct MsData {
    ms_path: Option<PathBuf>,

    data: Option<PsData>,
}

fn log_no_ms() {
    info!("No MS path set, cannot access data");
}

impl MsData {
    pub fn new(ms_path: Option<&Path>, data_group: DataGroup) -> Result<MsData, PsError> {
        let data = match ms_path {
            Some(path) => {
                let reader = MsReader::new(path, data_group)?;
                Some(PsData {
                    original: ProcessingSet::read(&reader)?,
                    selected: None,
                })
            }
            None => None,
        };
        Ok(MsData {
            ms_path: ms_path.map(Path::to_path_buf),
            data,
        })
    }

    pub fn from_processing_set(ps: ProcessingSet) -> MsData {
        MsData {
            ms_path: Some(ps.meta().path.clone()),
            data: Some(PsData {
                original: ps,
                selected: None,
            }),
        }
    }

    /// Can data be accessed?
    pub fn is_valid(&self) -> bool {
        self.data.is_some()
    }

    pub fn get_path(&self) -> Option<&Path> {
        self.ms_path.as_deref()
    }

    pub fn is_ms_path(&self, path: &Path) -> bool {
        self.get_path() == Some(path)
    }

    fn current(&self) -> Option<&ProcessingSet> {
        match self.data.as_ref() {
            Some(d) => Some(d.current()),
            None => {
                log_no_ms();
                None
            }
        }
    }

    /// The current (possibly selected) processing set.
    pub fn processing_set(&self) -> Option<&ProcessingSet> {
        self.current()
    }

    pub fn data_group(&self) -> Option<DataGroup> {
        self.current().map(|ps| ps.data_group())
    }

    /// The data groups present in the measurement set.
    pub fn data_groups(&self) -> Option<Vec<DataGroup>> {
        self.current().map(|ps| ps.data_groups().to_vec())
    }

    pub fn summary(&self) -> Option<Vec<SummaryRow>> {
        self.current().map(|ps| ps.summary())
    }

    pub fn num_ms(&self) -> Option<usize> {
        self.current().map(|ps| ps.len())
    }

    pub fn max_data_dims(&self) -> Option<IndexMap<PsDim, usize>> {
        self.current().map(|ps| ps.max_dims())
    }

    pub fn data_dimensions(&self) -> Option<Vec<PsDim>> {
        self.current().map(|ps| ps.data_dimensions())
    }

    pub fn dimension_values(&self, dim: PsDim) -> Option<Vec<String>> {
        self.current().map(|ps| ps.dimension_values(dim))
    }

    pub fn first_spw(&self) -> Option<String> {
        self.current().and_then(|ps| ps.first_spw().map(String::from))
    }

    fn select_with<F>(&mut self, select: F) -> Result<(), PsError>
    where
        F: FnOnce(&ProcessingSet) -> Result<ProcessingSet, PsError>,
    {
        match self.data.as_mut() {
            Some(d) => {
                let selected = select(d.current())?;
                debug!("Selection leaves {} partitions", selected.len());
                d.selected = Some(selected);
            }
            None => log_no_ms(),
        }
        Ok(())
    }

    /// Select partitions. Selections accumulate until
    /// [`MsData::clear_selection`].
    pub fn select_ps(&mut self, selection: &PsSelection) -> Result<(), PsError> {
        self.select_with(|ps| ps.select_ps(selection))
    }

    /// Select within partitions. Selections accumulate until
    /// [`MsData::clear_selection`].
    pub fn select_ms(&mut self, selection: &MsSelection) -> Result<(), PsError> {
        self.select_with(|ps| ps.select_ms(selection))
    }

    pub fn clear_selection(&mut self) {
        if let Some(d) = self.data.as_mut() {
            d.selected = None;
        }
    }

    /// Statistics of `vis_axis` over the partitions of the unselected data
    /// matching `selection`.
    pub fn vis_stats(
        &self,
        selection: &PsSelection,
        vis_axis: Axis,
    ) -> Result<Option<VisStats>, PsError> {
        let original = match self.data.as_ref() {
            Some(d) => &d.original,
            None => {
                log_no_ms();
                return Ok(None);
            }
        };
        let stats = if selection.is_empty() {
            original.vis_stats(vis_axis)?
        } else {
            original.select_ps(selection)?.vis_stats(vis_axis)?
        };
        Ok(Some(stats))
    }

    /// Check `inputs` and make raster planes from the current selection.
    pub fn raster_data(
        &self,
        inputs: &mut RasterInputs,
    ) -> Result<Option<RasterData>, RasterError> {
        let ps = match self.current() {
            Some(ps) => ps,
            None => return Ok(None),
        };
        inputs.check(&ps.data_dimensions())?;

        let stats = match inputs.color_mode {
            Some(ColorMode::Auto) if inputs.vis_axis != Axis::Phase => {
                match ps.vis_stats(inputs.vis_axis) {
                    Ok(s) => Some(s),
                    Err(PsError::AllFlagged) => {
                        warn!("All data are flagged; colour limits come from each plane");
                        None
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            _ => None,
        };
        raster_data(ps, inputs, stats.as_ref()).map(Some)
    }
}
