//! The user's campaign, city, and area choice over the fetched catalogs.

use britmetrics_api_models::{Area, Campaign, CampaignCatalog, City, CityCatalog, PredictRequest};
use thiserror::Error;

/// A rejected selection change. The previous selection is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Unknown campaign id '{0}'")]
    UnknownCampaign(String),

    #[error("Unknown city id '{0}'")]
    UnknownCity(String),

    #[error("Unknown area id '{area}' for city '{city}'")]
    UnknownArea { city: String, area: String },
}

/// The ids a prediction was requested for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionKey {
    pub campaign_id: String,
    pub city_id: String,
    pub area_id: String,
}

impl From<&PredictRequest> for SelectionKey {
    fn from(request: &PredictRequest) -> Self {
        Self {
            campaign_id: request.campaign_id.clone().unwrap_or_default(),
            city_id: request.city_id.clone(),
            area_id: request.area_id.clone(),
        }
    }
}

/// Current selection plus the catalogs it indexes into.
///
/// An empty id means "nothing selected". A non-empty city id always names
/// a city in the catalog, and a non-empty area id always names an area of
/// that city.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    campaigns: CampaignCatalog,
    cities: CityCatalog,
    campaign_id: String,
    city_id: String,
    area_id: String,
}

impl Selection {
    /// Builds a selection with the catalog defaults applied: the declared
    /// default campaign and city (else the first entry), and the first area
    /// of that city.
    #[must_use]
    pub fn new(campaigns: CampaignCatalog, cities: CityCatalog) -> Self {
        let campaign_id = campaigns.default_id().unwrap_or_default().to_string();

        let city_id = cities
            .default_id()
            .filter(|id| cities.city(id).is_some())
            .unwrap_or_default()
            .to_string();

        let area_id = cities
            .city(&city_id)
            .and_then(City::first_area)
            .map(|a| a.id.clone())
            .unwrap_or_default();

        Self {
            campaigns,
            cities,
            campaign_id,
            city_id,
            area_id,
        }
    }

    #[must_use]
    pub const fn campaigns(&self) -> &CampaignCatalog {
        &self.campaigns
    }

    #[must_use]
    pub const fn cities(&self) -> &CityCatalog {
        &self.cities
    }

    #[must_use]
    pub fn campaign_id(&self) -> &str {
        &self.campaign_id
    }

    #[must_use]
    pub fn city_id(&self) -> &str {
        &self.city_id
    }

    #[must_use]
    pub fn area_id(&self) -> &str {
        &self.area_id
    }

    /// Areas of the selected city; empty when no city is selected.
    #[must_use]
    pub fn areas(&self) -> &[Area] {
        self.selected_city()
            .map(|c| c.areas.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn selected_campaign(&self) -> Option<&Campaign> {
        self.campaigns.campaign(&self.campaign_id)
    }

    #[must_use]
    pub fn selected_city(&self) -> Option<&City> {
        self.cities.city(&self.city_id)
    }

    #[must_use]
    pub fn selected_area(&self) -> Option<&Area> {
        self.selected_city().and_then(|c| c.area(&self.area_id))
    }

    /// Selects a campaign. An empty id selects the generic analysis.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownCampaign`] if the id is not in the
    /// catalog.
    pub fn select_campaign(&mut self, id: &str) -> Result<(), SelectionError> {
        if !id.is_empty() && self.campaigns.campaign(id).is_none() {
            return Err(SelectionError::UnknownCampaign(id.to_string()));
        }
        self.campaign_id = id.to_string();
        Ok(())
    }

    /// Selects a city and resets the area to that city's first area, or to
    /// nothing if it has none. An empty id clears both.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownCity`] if the id is not in the
    /// catalog.
    pub fn select_city(&mut self, id: &str) -> Result<(), SelectionError> {
        let area_id = if id.is_empty() {
            String::new()
        } else {
            let city = self
                .cities
                .city(id)
                .ok_or_else(|| SelectionError::UnknownCity(id.to_string()))?;
            city.first_area().map(|a| a.id.clone()).unwrap_or_default()
        };

        self.city_id = id.to_string();
        self.area_id = area_id;
        Ok(())
    }

    /// Selects an area of the current city. An empty id clears it.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownArea`] if the area does not belong
    /// to the selected city.
    pub fn select_area(&mut self, id: &str) -> Result<(), SelectionError> {
        if !id.is_empty() && self.selected_city().and_then(|c| c.area(id)).is_none() {
            return Err(SelectionError::UnknownArea {
                city: self.city_id.clone(),
                area: id.to_string(),
            });
        }
        self.area_id = id.to_string();
        Ok(())
    }

    /// Whether both a city and an area are selected.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.city_id.is_empty() && !self.area_id.is_empty()
    }

    #[must_use]
    pub fn key(&self) -> SelectionKey {
        SelectionKey {
            campaign_id: self.campaign_id.clone(),
            city_id: self.city_id.clone(),
            area_id: self.area_id.clone(),
        }
    }

    /// The prediction request for this selection, if it is complete.
    #[must_use]
    pub fn request(&self) -> Option<PredictRequest> {
        if !self.is_complete() {
            return None;
        }
        Some(PredictRequest {
            city_id: self.city_id.clone(),
            area_id: self.area_id.clone(),
            campaign_id: Some(self.campaign_id.clone()).filter(|id| !id.is_empty()),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use britmetrics_api_models::{Area, Campaign, CampaignCatalog, City, CityCatalog};

    pub fn area(id: &str, footfall_daily: u64) -> Area {
        Area {
            id: id.to_string(),
            name: id.replace('-', " "),
            description: String::new(),
            footfall_daily,
            population: 10_000,
            center: None,
            meta: String::new(),
        }
    }

    pub fn campaign(id: &str) -> Campaign {
        Campaign {
            id: id.to_string(),
            name: id.to_string(),
            summary: String::new(),
            highlights: Vec::new(),
            ideal_factors: Vec::new(),
            target_demographics: Vec::new(),
        }
    }

    pub fn campaigns() -> CampaignCatalog {
        CampaignCatalog {
            campaigns: vec![campaign("generic"), campaign("tech-startup")],
            default_campaign_id: Some("generic".to_string()),
        }
    }

    pub fn cities() -> CityCatalog {
        CityCatalog {
            cities: vec![
                City {
                    id: "manchester".to_string(),
                    name: "Manchester".to_string(),
                    areas: vec![area("albert-square", 120_000), area("piccadilly", 95_000)],
                },
                City {
                    id: "london".to_string(),
                    name: "London".to_string(),
                    areas: vec![area("oxford-circus", 400_000)],
                },
                City {
                    id: "leeds".to_string(),
                    name: "Leeds".to_string(),
                    areas: Vec::new(),
                },
            ],
            default_city_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{campaigns, cities};
    use super::*;

    #[test]
    fn applies_catalog_defaults() {
        let selection = Selection::new(campaigns(), cities());
        assert_eq!(selection.campaign_id(), "generic");
        assert_eq!(selection.city_id(), "manchester");
        assert_eq!(selection.area_id(), "albert-square");
        assert_eq!(selection.areas().len(), 2);
    }

    #[test]
    fn empty_catalogs_select_nothing() {
        let selection = Selection::new(CampaignCatalog::default(), CityCatalog::default());
        assert_eq!(selection.campaign_id(), "");
        assert!(selection.areas().is_empty());
        assert!(!selection.is_complete());
        assert!(selection.request().is_none());
    }

    #[test]
    fn selecting_a_city_resets_the_area() {
        let mut selection = Selection::new(campaigns(), cities());
        selection.select_area("piccadilly").unwrap();

        selection.select_city("london").unwrap();
        assert_eq!(selection.area_id(), "oxford-circus");

        selection.select_city("leeds").unwrap();
        assert_eq!(selection.area_id(), "");
        assert!(selection.areas().is_empty());

        selection.select_city("manchester").unwrap();
        assert_eq!(selection.area_id(), "albert-square");
    }

    #[test]
    fn area_from_another_city_is_rejected() {
        let mut selection = Selection::new(campaigns(), cities());

        let err = selection.select_area("oxford-circus").unwrap_err();
        assert_eq!(
            err,
            SelectionError::UnknownArea {
                city: "manchester".to_string(),
                area: "oxford-circus".to_string(),
            }
        );
        assert_eq!(selection.area_id(), "albert-square");
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut selection = Selection::new(campaigns(), cities());
        assert!(selection.select_city("paris").is_err());
        assert!(selection.select_campaign("crypto").is_err());
        assert_eq!(selection.city_id(), "manchester");
        assert_eq!(selection.campaign_id(), "generic");
    }

    #[test]
    fn empty_campaign_omits_campaign_from_request() {
        let mut selection = Selection::new(campaigns(), cities());
        selection.select_campaign("").unwrap();

        let request = selection.request().unwrap();
        assert_eq!(request.campaign_id, None);
        assert_eq!(SelectionKey::from(&request), selection.key());

        selection.select_campaign("tech-startup").unwrap();
        assert_eq!(
            selection.request().unwrap().campaign_id.as_deref(),
            Some("tech-startup")
        );
        assert_eq!(selection.selected_campaign().unwrap().id, "tech-startup");
    }
}
