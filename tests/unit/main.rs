mod response_classification;
