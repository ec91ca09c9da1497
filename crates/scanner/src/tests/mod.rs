mod helpers;

mod assessment_properties;
