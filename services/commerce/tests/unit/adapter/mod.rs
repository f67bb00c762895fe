mod datastore;
